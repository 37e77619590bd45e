use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookstore API",
        version = "0.1.0",
        description = r#"
Backend for an online bookstore.

## Features

- **Catalog**: browse active books, filter by category, search by title/author
- **Cart**: per-user cart lines with stock-checked quantities
- **Checkout**: atomic cart-to-order conversion with captured unit prices
- **Orders**: customer history plus staff approval/deletion workflow
- **Reviews**: 1-5 star ratings attached to books
- **Dashboard**: today/month revenue and best sellers for staff

## Authentication

Obtain a token via `POST /auth/login` and pass it as a bearer token:

```
Authorization: Bearer <token>
```

Routes under `/api/v1/manage` additionally require the staff flag.
"#
    ),
    components(schemas(crate::errors::ErrorResponse)),
    tags(
        (name = "catalog", description = "Storefront browsing"),
        (name = "cart", description = "Cart management"),
        (name = "orders", description = "Checkout and order history"),
        (name = "manage", description = "Staff-only back office")
    )
)]
pub struct ApiDoc;

/// Mounts the Swagger UI with the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
