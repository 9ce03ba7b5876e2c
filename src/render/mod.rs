//! Page rendering and navigation
//!
//! Every page is a pure function of the context (plus, for ML Modeling, the
//! last form submission), so re-selecting a page renders identical bytes.

pub mod html;

use crate::context::AppContext;
use crate::error::Result;
use crate::predict::{
    PredictionForm, PredictionOutcome, DOORS_IN_ROUTE_SLIDER, ROUTES_COMPLETED_SLIDER,
    TIME_SPENT_SLIDER,
};

/// The five pages offered by the sidebar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Page {
    #[default]
    Dashboard,
    Eda,
    Maps,
    MlModeling,
    DataCollection,
}

impl Page {
    /// Sidebar order
    pub const ALL: [Page; 5] = [
        Page::Dashboard,
        Page::Eda,
        Page::Maps,
        Page::MlModeling,
        Page::DataCollection,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Eda => "EDA",
            Page::Maps => "Maps",
            Page::MlModeling => "ML Modeling",
            Page::DataCollection => "Data Collection",
        }
    }

    /// Value of the `page` query parameter
    pub fn slug(self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Eda => "eda",
            Page::Maps => "maps",
            Page::MlModeling => "ml-modeling",
            Page::DataCollection => "data-collection",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Page> {
        Page::ALL.into_iter().find(|p| p.slug() == slug)
    }
}

/// Current values of the prediction form
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub neighbourhood: Option<String>,
    pub stake: Option<String>,
    pub route: Option<String>,
    pub routes_completed: i64,
    pub time_spent: i64,
    pub doors_in_route: i64,
    pub outcome: Option<PredictionOutcome>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            neighbourhood: None,
            stake: None,
            route: None,
            routes_completed: ROUTES_COMPLETED_SLIDER.default,
            time_spent: TIME_SPENT_SLIDER.default,
            doors_in_route: DOORS_IN_ROUTE_SLIDER.default,
            outcome: None,
        }
    }
}

impl FormState {
    /// Echo a submission back; unparsable slider values fall back to defaults
    /// and empty selects to the first option
    pub fn from_submission(form: &PredictionForm, outcome: PredictionOutcome) -> Self {
        let slider = |raw: &str, default: i64| raw.trim().parse().unwrap_or(default);
        let choice = |raw: &str| (!raw.is_empty()).then(|| raw.to_string());
        Self {
            neighbourhood: choice(&form.neighbourhood),
            stake: choice(&form.stake),
            route: choice(&form.route),
            routes_completed: slider(&form.routes_completed, ROUTES_COMPLETED_SLIDER.default),
            time_spent: slider(&form.time_spent, TIME_SPENT_SLIDER.default),
            doors_in_route: slider(&form.doors_in_route, DOORS_IN_ROUTE_SLIDER.default),
            outcome: Some(outcome),
        }
    }
}

/// Render a full HTML document for `page`
pub fn render_page(ctx: &AppContext, page: Page, form: Option<&FormState>) -> Result<String> {
    let body = match page {
        Page::Dashboard => html::dashboard(),
        Page::Eda => html::visualizations(&ctx.config.embeds.report_url),
        Page::Maps => html::cluster_map(&ctx.config.assets.cluster_map)?,
        Page::MlModeling => {
            let default = FormState::default();
            html::machine_learning_modeling(&ctx.dataset.options, form.unwrap_or(&default))
        }
        Page::DataCollection => html::data_collection(&ctx.config.embeds.form_url),
    };
    Ok(html::layout(page, &body))
}
