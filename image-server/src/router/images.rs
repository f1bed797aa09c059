use crate::{
    api_types::{ImageResponse, SeedResponse},
    db::tables::NewImage,
    error::ApiError,
    state::AppState,
};
use axum::{extract::State, Json};
use log::info;

pub async fn get_images(
    State(AppState { db, importer: _ }): State<AppState>,
) -> Result<Json<Vec<ImageResponse>>, ApiError> {
    let rows = db
        .list_images()
        .await
        .map_err(ApiError::internal("failed to fetch images"))?;

    Ok(Json(rows.into_iter().map(ImageResponse::from).collect()))
}

fn test_image(name: &str, drive_id: &str, size: u64, mime_type: &str, storage_url: &str) -> NewImage {
    NewImage {
        name: name.to_owned(),
        google_drive_id: Some(drive_id.to_owned()),
        size: Some(size),
        mime_type: Some(mime_type.to_owned()),
        storage_url: storage_url.to_owned(),
        source: "test".to_owned(),
    }
}

/// Development helper: put a few known images in the catalog without touching Drive.
pub async fn add_test_images(
    State(AppState { db, importer: _ }): State<AppState>,
) -> Result<Json<SeedResponse>, ApiError> {
    let test_images = [
        test_image(
            "landscape.jpg",
            "test_1",
            1_500_000,
            "image/jpeg",
            "https://images.unsplash.com/photo-1506744038136-46273834b3fb",
        ),
        test_image(
            "portrait.png",
            "test_2",
            800_000,
            "image/png",
            "https://images.unsplash.com/photo-1519681393784-d120267933ba",
        ),
        test_image(
            "nature.jpg",
            "test_3",
            1_200_000,
            "image/jpeg",
            "https://images.unsplash.com/photo-1441974231531-c6227db76b6e",
        ),
    ];

    let mut count = 0;
    for image in &test_images {
        if db
            .insert_image(image)
            .await
            .map_err(ApiError::internal("failed to add test images"))?
        {
            count += 1;
        }
    }
    info!("seeded {} test images", count);

    Ok(Json(SeedResponse {
        message: format!("Added {count} test images"),
        count,
    }))
}
