use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub message: Option<String>,
}
