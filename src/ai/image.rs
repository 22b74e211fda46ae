//! Image inlining for multimodal prompts

use base64::{Engine as _, engine::general_purpose};

/// Transparent 1x1 GIF used when an image cannot be fetched
pub const FALLBACK_IMAGE_DATA_URI: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

async fn fetch_data_uri(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    let response = client.get(url).send().await?.error_for_status()?;
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
    let bytes = response.bytes().await?;

    Ok(format!(
        "data:{};base64,{}",
        content_type,
        general_purpose::STANDARD.encode(&bytes)
    ))
}

/// Fetch an image and encode it as a data URI.
///
/// Never fails: any fetch error yields [`FALLBACK_IMAGE_DATA_URI`].
pub async fn image_data_uri(client: &reqwest::Client, url: &str) -> String {
    match fetch_data_uri(client, url).await {
        Ok(data_uri) => data_uri,
        Err(error) => {
            tracing::warn!(url, %error, "Image fetch failed, using placeholder");
            FALLBACK_IMAGE_DATA_URI.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_image_uses_placeholder() {
        let client = reqwest::Client::new();
        let uri = image_data_uri(&client, "http://127.0.0.1:9/missing.png").await;
        assert_eq!(uri, FALLBACK_IMAGE_DATA_URI);
    }

    #[tokio::test]
    async fn fetched_image_is_inlined() {
        use axum::{Router, http::header, routing::get};

        let app = Router::new().route(
            "/pixel.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![1u8, 2, 3]) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let uri = image_data_uri(&reqwest::Client::new(), &format!("http://{addr}/pixel.png")).await;
        assert_eq!(uri, "data:image/png;base64,AQID");
    }
}
