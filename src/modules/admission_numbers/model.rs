pub use admitrack_models::admission_numbers::{
    AdmissionNumberExists, AdmissionNumberExistsQuery, AdmissionNumberParts, AdmissionNumberQuery,
    AdmissionNumberValidity, AdmissionRequest, GeneratedAdmissionNumber,
    NextAdmissionNumberResponse, RegenerateAdmissionNumbersDto, RegenerationSummary,
};
