//! UI action running an indicator generator.
//!
//! Errors never escape the action: they are logged and returned in the
//! response for display.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::Locale;
use crate::error::AccountError;
use crate::indicator::generator::IndicatorGeneratorService;
use crate::AccountResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Id of the generator in the view context
    pub id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub reload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    fn traced(err: &AccountError) -> Self {
        ActionResponse {
            reload: false,
            flash: None,
            error: Some(err.to_string()),
        }
    }
}

fn request_executed(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Request executed",
        Locale::Fr => "Requête exécutée",
    }
}

pub struct IndicatorGeneratorController<S: IndicatorGeneratorService> {
    service: S,
    locale: Locale,
}

impl<S: IndicatorGeneratorService> IndicatorGeneratorController<S> {
    pub fn new(service: S, locale: Locale) -> Self {
        IndicatorGeneratorController { service, locale }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn run(&mut self, request: &ActionRequest) -> ActionResponse {
        match self.execute(request.id) {
            Ok(()) => ActionResponse {
                reload: true,
                flash: Some(request_executed(self.locale).to_string()),
                error: None,
            },
            Err(e) => {
                error!(generator_id = request.id, error = %e, "indicator generator failed");
                ActionResponse::traced(&e)
            }
        }
    }

    fn execute(&mut self, id: u64) -> AccountResult<()> {
        let generator = self.service.find(id)?;
        self.service.run(&generator)?;
        info!(generator_id = id, name = %generator.name, "indicator generator executed");
        Ok(())
    }
}
