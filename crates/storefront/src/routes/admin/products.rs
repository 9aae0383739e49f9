//! Back-office product management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use vitrina_core::ProductId;

use super::{finish_mutation, rows_or_flash};
use crate::api::{ApiError, Product, ProductInput};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin, push_flash};
use crate::models::Flash;
use crate::state::AppState;

const LIST: &str = "/admin/products";

/// Product form data, kept as text so invalid input can be shown back.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub stock: String,
}

impl ProductForm {
    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            image: product.image.clone().unwrap_or_default(),
            stock: product.stock.max(0).to_string(),
        }
    }

    /// Validate into the backend body, or every problem found.
    fn validate(&self) -> std::result::Result<ProductInput, Vec<String>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("Name is required".to_string());
        }

        let price = match self.price.trim().parse::<Decimal>() {
            Ok(price) if price.is_sign_negative() => {
                errors.push("Price cannot be negative".to_string());
                None
            }
            Ok(price) => Some(price),
            Err(_) => {
                errors.push("Price must be a number".to_string());
                None
            }
        };

        let stock = match self.stock.trim() {
            "" => Some(0),
            raw => raw.parse::<u32>().map_or_else(
                |_| {
                    errors.push("Stock must be a whole number of zero or more".to_string());
                    None
                },
                Some,
            ),
        };

        let image = self.image.trim();
        if !image.is_empty() && url::Url::parse(image).is_err() {
            errors.push("Image must be a full URL".to_string());
        }

        match (price, stock) {
            (Some(price), Some(stock)) if errors.is_empty() => Ok(ProductInput {
                name: name.to_string(),
                description: self.description.trim().to_string(),
                price,
                image: image.to_string(),
                stock,
            }),
            _ => Err(errors),
        }
    }
}

/// Product table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/index.html")]
pub struct ProductsTemplate {
    pub ctx: PageContext,
    pub products: Vec<Product>,
}

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/form.html")]
pub struct ProductFormTemplate {
    pub ctx: PageContext,
    pub heading: &'static str,
    pub action: String,
    pub form: ProductForm,
    pub errors: Vec<String>,
}

/// Display the product table.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_auth): RequireAdmin,
    mut ctx: PageContext,
) -> Result<ProductsTemplate> {
    let result = state
        .backend()
        .list_products()
        .await
        .map(|products| products.as_ref().clone());
    let products = rows_or_flash(result, &mut ctx, "products")?;
    Ok(ProductsTemplate { ctx, products })
}

/// Display the empty create form.
pub async fn new(RequireAdmin(_auth): RequireAdmin, ctx: PageContext) -> impl IntoResponse {
    ProductFormTemplate {
        ctx,
        heading: "New product",
        action: LIST.to_string(),
        form: ProductForm::default(),
        errors: Vec::new(),
    }
}

/// Create a product.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    ctx: PageContext,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(ProductFormTemplate {
                ctx,
                heading: "New product",
                action: LIST.to_string(),
                form,
                errors,
            }
            .into_response());
        }
    };

    let outcome = state.backend().create_product(&auth.token, &input).await;
    ctx.requeue(&session).await?;
    let redirect = finish_mutation(
        &session,
        outcome,
        format!("Product \"{}\" created", input.name),
        "Could not create the product",
        LIST,
    )
    .await?;
    Ok(redirect.into_response())
}

/// Display the edit form for an existing product.
#[instrument(skip(state, session, _auth, ctx))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_auth): RequireAdmin,
    ctx: PageContext,
    Path(id): Path<String>,
) -> Result<Response> {
    match state.backend().get_product(&ProductId::new(id.clone())).await {
        Ok(product) => Ok(ProductFormTemplate {
            ctx,
            heading: "Edit product",
            action: format!("{LIST}/{}", urlencoding::encode(&id)),
            form: ProductForm::from_product(&product),
            errors: Vec::new(),
        }
        .into_response()),
        Err(ApiError::Unauthorized(_)) => Err(AppError::SessionExpired),
        Err(e) => {
            tracing::warn!(error = %e, product_id = %id, "cannot edit product");
            ctx.requeue(&session).await?;
            push_flash(&session, Flash::error(e.user_message())).await?;
            Ok(Redirect::to(LIST).into_response())
        }
    }
}

/// Update a product.
#[instrument(skip(state, session, auth, ctx, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    ctx: PageContext,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(ProductFormTemplate {
                ctx,
                heading: "Edit product",
                action: format!("{LIST}/{}", urlencoding::encode(&id)),
                form,
                errors,
            }
            .into_response());
        }
    };

    let outcome = state
        .backend()
        .update_product(&auth.token, &ProductId::new(id), &input)
        .await;
    ctx.requeue(&session).await?;
    let redirect = finish_mutation(
        &session,
        outcome,
        format!("Product \"{}\" updated", input.name),
        "Could not update the product",
        LIST,
    )
    .await?;
    Ok(redirect.into_response())
}

/// Delete a product.
#[instrument(skip(state, session, auth))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let outcome = state
        .backend()
        .delete_product(&auth.token, &ProductId::new(id))
        .await;
    finish_mutation(
        &session,
        outcome,
        "Product deleted".to_string(),
        "Could not delete the product",
        LIST,
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, price: &str, stock: &str, image: &str) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            description: "  Calabaza curada  ".to_string(),
            price: price.to_string(),
            image: image.to_string(),
            stock: stock.to_string(),
        }
    }

    #[test]
    fn test_valid_form_becomes_input() {
        let input = form(" Mate ", "1500.50", "12", "https://img.example/mate.jpg")
            .validate()
            .unwrap();
        assert_eq!(input.name, "Mate");
        assert_eq!(input.description, "Calabaza curada");
        assert_eq!(input.price, Decimal::new(150_050, 2));
        assert_eq!(input.stock, 12);
    }

    #[test]
    fn test_blank_stock_and_image_are_allowed() {
        let input = form("Mate", "0", "", "").validate().unwrap();
        assert_eq!(input.stock, 0);
        assert_eq!(input.image, "");
    }

    #[test]
    fn test_every_problem_is_reported() {
        let errors = form("", "-3", "many", "not a url").validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Name is required",
                "Price cannot be negative",
                "Stock must be a whole number of zero or more",
                "Image must be a full URL",
            ]
        );
    }

    #[test]
    fn test_non_numeric_price() {
        let errors = form("Mate", "abc", "1", "").validate().unwrap_err();
        assert_eq!(errors, vec!["Price must be a number"]);
    }
}
