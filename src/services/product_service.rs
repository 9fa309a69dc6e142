use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::products::{
        CategoryList, CreateCategoryRequest, CreateProductRequest, ProductDetail, ProductList,
        ProductQuery,
    },
    error::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::{Category, Product, ProductImage},
    response::{ApiResponse, Meta},
};

pub async fn list_products(
    pool: &DbPool,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let products: Vec<Product> = match query.category.as_ref().filter(|c| !c.is_empty()) {
        Some(category) => {
            sqlx::query_as(
                r#"
                SELECT p.* FROM products p
                JOIN categories c ON c.id = p.category_id
                WHERE c.name = $1
                ORDER BY p.created_at DESC
                "#,
            )
            .bind(category)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM products ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?
        }
    };

    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let mut images = images_by_product(pool, &ids).await?;

    let items = products
        .into_iter()
        .map(|product| {
            let product_images = images.remove(&product.id).unwrap_or_default();
            product_detail(product, product_images)
        })
        .collect();

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_product(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut images = images_by_product(pool, &[id]).await?;
    let product_images = images.remove(&id).unwrap_or_default();

    Ok(ApiResponse::success(
        "Product",
        product_detail(product, product_images),
        None,
    ))
}

pub async fn list_categories(pool: &DbPool) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<Category> = sqlx::query_as("SELECT * FROM categories ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        None,
    ))
}

/// Admin: create a product together with its image in one transaction.
pub async fn create_product(
    pool: &DbPool,
    user: &CurrentUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation(
            "Product name cannot be empty".to_string(),
        ));
    }
    if payload.price <= rust_decimal::Decimal::ZERO {
        return Err(AppError::Validation(
            "Product price must be greater than 0".to_string(),
        ));
    }
    if payload.stock < 0 {
        return Err(AppError::Validation(
            "Product stock cannot be negative".to_string(),
        ));
    }
    let image_url = payload.image_url.trim().to_string();
    if image_url.is_empty() {
        return Err(AppError::Validation(
            "Product image URL cannot be empty".to_string(),
        ));
    }

    let category: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
        .bind(payload.category_id)
        .fetch_optional(pool)
        .await?;
    if category.is_none() {
        return Err(AppError::Validation("Invalid category ID".to_string()));
    }

    let mut txn = pool.begin().await?;

    let product: Product = sqlx::query_as(
        r#"
        INSERT INTO products (id, name, description, price, stock, category_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .bind(payload.description.as_deref().map(str::trim))
    .bind(payload.price)
    .bind(payload.stock)
    .bind(payload.category_id)
    .fetch_one(&mut *txn)
    .await?;

    sqlx::query("INSERT INTO product_images (id, product_id, image_url) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(product.id)
        .bind(&image_url)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product_detail(product, vec![image_url]),
        Some(Meta::empty()),
    ))
}

/// Admin: delete a product. Images go first to honor the foreign key.
pub async fn delete_product(
    pool: &DbPool,
    user: &CurrentUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }

    let mut txn = pool.begin().await?;
    sqlx::query("DELETE FROM product_images WHERE product_id = $1")
        .bind(id)
        .execute(&mut *txn)
        .await?;
    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&mut *txn)
        .await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn create_category(
    pool: &DbPool,
    user: &CurrentUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation(
            "Category name cannot be empty".to_string(),
        ));
    }

    let taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE name = $1")
        .bind(&name)
        .fetch_optional(pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::Validation("Category already exists".to_string()));
    }

    let category: Category =
        sqlx::query_as("INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING *")
            .bind(Uuid::new_v4())
            .bind(&name)
            .fetch_one(pool)
            .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "category_create",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Category created", category, None))
}

async fn images_by_product(
    pool: &DbPool,
    product_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<String>>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<ProductImage> = sqlx::query_as(
        "SELECT * FROM product_images WHERE product_id = ANY($1) ORDER BY id",
    )
    .bind(product_ids.to_vec())
    .fetch_all(pool)
    .await?;

    let mut map: HashMap<Uuid, Vec<String>> = HashMap::new();
    for row in rows {
        map.entry(row.product_id).or_default().push(row.image_url);
    }
    Ok(map)
}

fn product_detail(product: Product, images: Vec<String>) -> ProductDetail {
    ProductDetail {
        id: product.id,
        name: product.name,
        description: product.description,
        price: product.price,
        stock: product.stock,
        category_id: product.category_id,
        images,
    }
}
