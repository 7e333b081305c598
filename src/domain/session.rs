use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatientId(i64);

impl PatientId {
    pub fn from_i64(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TherapistId(i64);

impl TherapistId {
    pub fn from_i64(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(i64);

impl SessionId {
    pub fn from_i64(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// Long-lived session row written once at finalization. The transcript is
/// optional: an upload whose transcription failed still yields a session with
/// the audio attached.
#[derive(Debug, Clone)]
pub struct NewSessionRecord {
    pub patient_id: PatientId,
    pub therapist_id: TherapistId,
    pub session_date: NaiveDate,
    pub session_notes: String,
    pub audio_url: String,
    pub transcript_url: Option<String>,
}
