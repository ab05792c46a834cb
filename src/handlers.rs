use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiResult, ErrorResponse},
    extract::ValidJson,
    models::{
        AccountResponse, Category, CategoryCreated, CategoryList, LoginRequest, MenuItem,
        MenuOverview, MessageResponse, NewCategory, NewMenuItem, NewRestaurant, RegisterRequest,
        Restaurant, RestaurantList, TokenResponse,
    },
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

// --- Public Handlers ---

/// home_page
///
/// [Public Route] Everything the landing page needs in one body.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Restaurants, categories and menu items", body = MenuOverview))
)]
pub async fn home_page(State(state): State<AppState>) -> ApiResult<Json<MenuOverview>> {
    let restaurants = state.repo.list_restaurants().await?;
    let categories = state.repo.list_categories().await?;
    let items = state.repo.list_menu_items().await?;
    Ok(Json(MenuOverview {
        restaurants,
        categories,
        items,
    }))
}

/// get_public_menu
#[utoipa::path(
    get,
    path = "/api/menu",
    responses((status = 200, description = "All menu items", body = [MenuItem]))
)]
pub async fn get_public_menu(State(state): State<AppState>) -> ApiResult<Json<Vec<MenuItem>>> {
    Ok(Json(state.repo.list_menu_items().await?))
}

/// get_public_categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "All categories", body = [Category]))
)]
pub async fn get_public_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.repo.list_categories().await?))
}

/// get_public_restaurants
#[utoipa::path(
    get,
    path = "/api/restaurants",
    responses((status = 200, description = "All restaurants", body = [Restaurant]))
)]
pub async fn get_public_restaurants(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Restaurant>>> {
    Ok(Json(state.repo.list_restaurants().await?))
}

/// register_user
///
/// [Public Route] Creates an account with the configured sign-up role.
/// The response never contains the password or its digest.
#[utoipa::path(
    post,
    path = "/sign_up",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AccountResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    let account = state.auth.register(payload, state.config.signup_role).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// login
///
/// [Public Route] Exchanges email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let token = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(TokenResponse { token }))
}

// --- Admin Handlers ---
// Reached only through the `require_admin` layer, which has already attached `AuthUser`.

/// add_restaurant
#[utoipa::path(
    post,
    path = "/admin/restaurants",
    request_body = NewRestaurant,
    responses(
        (status = 201, description = "Created", body = Restaurant),
        (status = 409, description = "Phone or email already used", body = ErrorResponse)
    )
)]
pub async fn add_restaurant(
    user: AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<NewRestaurant>,
) -> ApiResult<(StatusCode, Json<Restaurant>)> {
    let restaurant = state.repo.create_restaurant(payload).await?;
    tracing::info!(account_id = user.id, restaurant_id = restaurant.id, "Restaurant created");
    Ok((StatusCode::CREATED, Json(restaurant)))
}

/// add_menu_item
///
/// [Admin Route] The referenced category must exist, otherwise 400.
#[utoipa::path(
    post,
    path = "/admin/menu-items",
    request_body = NewMenuItem,
    responses(
        (status = 201, description = "Created", body = MenuItem),
        (status = 400, description = "Unknown category", body = ErrorResponse)
    )
)]
pub async fn add_menu_item(
    user: AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<NewMenuItem>,
) -> ApiResult<(StatusCode, Json<MenuItem>)> {
    let item = state.repo.create_menu_item(payload).await?;
    tracing::info!(account_id = user.id, menu_item_id = item.id, "Menu item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// add_categories
#[utoipa::path(
    post,
    path = "/admin/add-categories",
    request_body = NewCategory,
    responses((status = 200, description = "Created", body = CategoryCreated))
)]
pub async fn add_categories(
    user: AuthUser,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<NewCategory>,
) -> ApiResult<Json<CategoryCreated>> {
    let category = state.repo.create_category(payload).await?;
    tracing::info!(account_id = user.id, category_id = category.id, "Category created");
    Ok(Json(CategoryCreated { category }))
}

/// get_restaurants
///
/// [Admin Route] Unlike the public listing, an empty table is reported as 404.
#[utoipa::path(
    get,
    path = "/admin/all-restaurants",
    responses(
        (status = 200, description = "All restaurants", body = RestaurantList),
        (status = 404, description = "No restaurants", body = MessageResponse)
    )
)]
pub async fn get_restaurants(
    _user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Response> {
    let restaurants = state.repo.list_restaurants().await?;
    if restaurants.is_empty() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(MessageResponse::new("no restaurants found")),
        )
            .into_response());
    }
    Ok(Json(RestaurantList { restaurants }).into_response())
}

/// get_categories
#[utoipa::path(
    get,
    path = "/admin/all-categories",
    responses((status = 200, description = "All categories", body = CategoryList))
)]
pub async fn get_categories(
    _user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<CategoryList>> {
    let categories = state.repo.list_categories().await?;
    Ok(Json(CategoryList { categories }))
}

/// delete_restaurants
///
/// [Admin Route] Deletes every restaurant and restarts the id sequence.
#[utoipa::path(
    delete,
    path = "/admin/delete-restaurants",
    responses((status = 200, description = "Deleted", body = MessageResponse))
)]
pub async fn delete_restaurants(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<MessageResponse>> {
    state.repo.delete_all_restaurants().await?;
    tracing::warn!(account_id = user.id, "All restaurants deleted");
    Ok(Json(MessageResponse::new(
        "all restaurants deleted and id sequence reset",
    )))
}

/// delete_categories
///
/// [Admin Route] Deletes every category; their menu items go with them.
#[utoipa::path(
    delete,
    path = "/admin/delete-categories",
    responses((status = 200, description = "Deleted", body = MessageResponse))
)]
pub async fn delete_categories(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<MessageResponse>> {
    state.repo.delete_all_categories().await?;
    tracing::warn!(account_id = user.id, "All categories and menu items deleted");
    Ok(Json(MessageResponse::new(
        "all categories and their menu items deleted and id sequences reset",
    )))
}

