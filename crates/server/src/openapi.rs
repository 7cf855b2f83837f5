use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::pets::list_approved,
        crate::routes::pets::list_pending,
        crate::routes::pets::get,
        crate::routes::pets::create,
        crate::routes::pets::update,
        crate::routes::pets::delete,
        crate::routes::pets::submit,
        crate::routes::pets::approve,
        crate::routes::pets::request_adoption,
        crate::routes::pets::adopt,
        crate::routes::notifications::list,
    ),
    components(
        schemas(
            crate::routes::pets::PetPayload,
            crate::routes::pets::AdoptPayload,
            crate::errors::ErrorBody,
        )
    ),
    tags(
        (name = "health"),
        (name = "pets"),
        (name = "notifications")
    )
)]
pub struct ApiDoc;
