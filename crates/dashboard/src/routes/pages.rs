//! Page handlers: overview, catalog and subscription plans.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::Uri,
    response::{IntoResponse, Response},
};
use pos_dashboard_core::{
    AppSettings, BillingCycle, Category, Product,
    catalog::{products, products_in},
    plans::plans,
};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::Layout;
use super::not_found;
use crate::error::{AppError, Result};
use crate::seo::SeoMetadata;
use crate::state::{AppState, PriceFormatter};

/// Catalog filter query parameters.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
}

/// Billing cycle query parameters.
#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    pub billing: Option<String>,
}

/// Product display data for templates.
pub struct ProductView {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub price: String,
}

impl ProductView {
    fn new(product: &Product, formatter: &PriceFormatter) -> Self {
        Self {
            id: product.id.as_u32(),
            name: product.name,
            description: product.description,
            category: product.category.label(),
            price: formatter.format(product.price),
        }
    }
}

/// Category filter link.
pub struct CategoryView {
    pub slug: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Subscription plan display data for templates.
pub struct PlanView {
    pub name: &'static str,
    pub description: &'static str,
    pub price: String,
    pub period: &'static str,
    pub features: &'static [&'static str],
    pub highlighted: bool,
    /// Set when billed yearly.
    pub savings: Option<String>,
}

/// Overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub product_count: usize,
    pub category_count: usize,
    pub plan_count: usize,
    pub settings: AppSettings,
    pub time_format: &'static str,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "products.html")]
pub struct ProductsTemplate {
    pub layout: Layout,
    pub heading: String,
    pub currency: String,
    pub categories: Vec<CategoryView>,
    pub products: Vec<ProductView>,
}

/// Subscription plans page template.
#[derive(Template, WebTemplate)]
#[template(path = "subscription.html")]
pub struct SubscriptionTemplate {
    pub layout: Layout,
    pub yearly: bool,
    pub plans: Vec<PlanView>,
}

/// Display the overview page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>, uri: Uri) -> Result<impl IntoResponse> {
    let previous = record_visit(&state, &uri)?;
    let metadata = SeoMetadata::new(
        "Dashboard | POS",
        "Sales overview, catalog and settings for your point of sale.",
    );

    Ok(HomeTemplate {
        layout: layout(&state, &uri, &metadata, &previous),
        product_count: products().len(),
        category_count: Category::ALL.len(),
        plan_count: plans().len(),
        time_format: previous.time_format.as_str(),
        settings: previous,
    })
}

/// Display the product catalog, optionally filtered by category.
#[instrument(skip(state))]
pub async fn catalog(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<ProductsQuery>,
) -> Result<Response> {
    let selected = match query.category.as_deref().filter(|s| !s.trim().is_empty()) {
        None => None,
        Some(slug) => match slug.parse::<Category>() {
            Ok(category) => Some(category),
            Err(_) => return Ok(not_found::render(&state, &uri)),
        },
    };

    let previous = record_visit(&state, &uri)?;
    let formatter = state.price_formatter();

    let (heading, items): (String, Vec<ProductView>) = match selected {
        Some(category) => (
            category.label().to_owned(),
            products_in(category)
                .map(|p| ProductView::new(p, &formatter))
                .collect(),
        ),
        None => (
            "All products".to_owned(),
            products()
                .iter()
                .map(|p| ProductView::new(p, &formatter))
                .collect(),
        ),
    };

    let metadata = SeoMetadata::new(
        format!("{heading} | POS"),
        "Browse the product catalog with prices in your currency.",
    )
    .with_canonical_path(selected.map_or_else(
        || "/products".to_owned(),
        |c| format!("/products?category={}", c.slug()),
    ));

    let categories = Category::ALL
        .into_iter()
        .map(|c| CategoryView {
            slug: c.slug(),
            label: c.label(),
            active: selected == Some(c),
        })
        .collect();

    Ok(ProductsTemplate {
        layout: layout(&state, &uri, &metadata, &previous),
        heading,
        currency: formatter.currency().to_owned(),
        categories,
        products: items,
    }
    .into_response())
}

/// Display subscription plans for the chosen billing cycle.
#[instrument(skip(state))]
pub async fn subscription(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<SubscriptionQuery>,
) -> Result<impl IntoResponse> {
    let cycle = match query.billing.as_deref() {
        None | Some("") => BillingCycle::default(),
        Some(value) => value.parse::<BillingCycle>().map_err(AppError::BadRequest)?,
    };

    let previous = record_visit(&state, &uri)?;
    let formatter = state.price_formatter();
    let yearly = cycle == BillingCycle::Yearly;

    let plans = plans()
        .into_iter()
        .map(|plan| PlanView {
            name: plan.name,
            description: plan.description,
            price: formatter.format(plan.price(cycle)),
            period: cycle.period_label(),
            features: plan.features,
            highlighted: plan.highlighted,
            savings: yearly.then(|| formatter.format(plan.yearly_savings())),
        })
        .collect();

    let metadata = SeoMetadata::new(
        "Subscription Plans | POS",
        "Compare POS subscription plans and billing options.",
    )
    .with_canonical_path("/subscription");

    Ok(SubscriptionTemplate {
        layout: layout(&state, &uri, &metadata, &previous),
        yearly,
        plans,
    })
}

/// Store the visited page. A failed write is logged and the page still renders.
fn record_visit(state: &AppState, uri: &Uri) -> Result<AppSettings> {
    let path = uri.path_and_query().map_or_else(|| uri.path(), |pq| pq.as_str());
    match state.record_visit(path) {
        Ok(previous) => Ok(previous),
        Err(AppError::Settings(e)) => {
            warn!(error = %e, path, "Could not record visited page");
            state.settings()
        }
        Err(e) => Err(e),
    }
}

pub(super) fn layout(
    state: &AppState,
    uri: &Uri,
    metadata: &SeoMetadata,
    settings: &AppSettings,
) -> Layout {
    Layout {
        head: state.head(uri.path(), metadata),
        theme: settings.theme.as_str(),
        sidebar_collapsed: settings.sidebar_collapsed,
    }
}
