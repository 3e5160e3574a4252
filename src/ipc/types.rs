use serde::Deserialize;

use crate::form::EditableForm;
use crate::generate::GenerationBackend;
use crate::session::Session;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub session: Session,
    pub form: EditableForm,
    pub backend: Box<dyn GenerationBackend>,
}

impl AppState {
    pub fn new(backend: Box<dyn GenerationBackend>) -> Self {
        AppState {
            session: Session::default(),
            form: EditableForm::default(),
            backend,
        }
    }
}
