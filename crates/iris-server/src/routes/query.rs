use serde::Deserialize;

use iris_core::analytics::TimeWindow;

use crate::error::AppError;

/// Query string shared by every dashboard endpoint:
/// `?domain=a.com&from=2026-03-01&to=2026-03-31[&limit=10]`.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub domain: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Only read by the top pages / top referrers endpoints.
    pub limit: Option<u32>,
}

impl DashboardQuery {
    /// The required `domain` and the parsed window.
    ///
    /// A missing or empty domain is rejected here so it never reaches the
    /// repository.
    pub fn resolve(&self) -> Result<(&str, TimeWindow), AppError> {
        let domain = self
            .domain
            .as_deref()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| AppError::BadRequest("domain is required".to_string()))?;
        let window = TimeWindow::parse(self.from.as_deref(), self.to.as_deref())?;
        Ok((domain, window))
    }
}
