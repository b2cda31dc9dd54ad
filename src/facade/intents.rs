use serde_json::Value;

use crate::protocol::OutboundEnvelope;

/// Named requests with a fixed message / server action pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    RoutineToday,
    RegisterPrescription,
    UploadPrescriptionPhoto,
    RegisterRoutineList,
    CapturePillsPhoto,
    UploadPillsPhoto,
    SearchMedicines,
}

impl Intent {
    /// Spoken-style message the server expects for this intent
    pub fn message(self) -> &'static str {
        match self {
            Intent::RoutineToday => "오늘 복약 루틴 조회",
            Intent::RegisterPrescription => "처방전 복용 일정 등록",
            Intent::UploadPrescriptionPhoto => "처방전 사진 업로드",
            Intent::RegisterRoutineList => "루틴 등록",
            Intent::CapturePillsPhoto => "의약품 촬영",
            Intent::UploadPillsPhoto => "알약 사진 업로드",
            Intent::SearchMedicines => "약 검색",
        }
    }

    pub fn server_action(self) -> &'static str {
        match self {
            Intent::RoutineToday => "GET_ROUTINE_LIST_TODAY",
            Intent::RegisterPrescription => "PRESCRIPTION_ROUTINE_REGISTER_REQUEST",
            Intent::UploadPrescriptionPhoto => "UPLOAD_PRESCRIPTION_PHOTO",
            Intent::RegisterRoutineList => "REGISTER_ROUTINE_LIST",
            Intent::CapturePillsPhoto => "CAPTURE_PILLS_PHOTO_REQUEST",
            Intent::UploadPillsPhoto => "UPLOAD_PILLS_PHOTO",
            Intent::SearchMedicines => "SEARCH_MEDICINES",
        }
    }

    pub fn envelope(self, data: Option<Value>) -> OutboundEnvelope {
        OutboundEnvelope::new(self.message(), Some(self.server_action().to_string()), data)
    }

    /// Search carries the query both in the message and in the payload
    pub fn search(query: &str) -> OutboundEnvelope {
        OutboundEnvelope::new(
            format!("{}: {}", Intent::SearchMedicines.message(), query),
            Some(Intent::SearchMedicines.server_action().to_string()),
            Some(serde_json::json!({ "query": query })),
        )
    }
}
