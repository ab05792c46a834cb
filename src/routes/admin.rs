use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Admin Router Module
///
/// Menu maintenance endpoints, nested under `/admin`.
///
/// Access Control:
/// Every route here sits behind the `require_admin` route layer, which runs the full
/// authorization gate (bearer token, signature, expiry, role == admin) and attaches the
/// resolved `AuthUser` to the request before the handler is called.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /admin/restaurants
        .route("/restaurants", post(handlers::add_restaurant))
        // POST /admin/menu-items
        // Rejected with 400 when the referenced category does not exist.
        .route("/menu-items", post(handlers::add_menu_item))
        // POST /admin/add-categories
        .route("/add-categories", post(handlers::add_categories))
        // GET /admin/all-restaurants
        // 404 when there are no restaurants at all.
        .route("/all-restaurants", get(handlers::get_restaurants))
        // GET /admin/all-categories
        .route("/all-categories", get(handlers::get_categories))
        // DELETE /admin/delete-restaurants
        // Bulk delete; the id sequence restarts at 1.
        .route("/delete-restaurants", delete(handlers::delete_restaurants))
        // DELETE /admin/delete-categories
        // Bulk delete; cascades to menu items.
        .route("/delete-categories", delete(handlers::delete_categories))
}
