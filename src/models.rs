//! Wire types for the Photos Library API and OAuth token endpoints.

use serde::{Deserialize, Serialize};

/// A single media item as returned by the library and search endpoints.
///
/// `id` is globally unique and stable across pagination; `base_url` is a
/// short-lived pre-signed URL that yields the downloadable bytes once a
/// variant suffix is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Stable item identifier.
    pub id: String,
    /// Original filename, used for archive entry names.
    pub filename: String,
    /// MIME type, e.g. `image/jpeg` or `video/mp4`.
    #[serde(default)]
    pub mime_type: String,
    /// Pre-signed base URL for the item's bytes.
    #[serde(default)]
    pub base_url: String,
}

impl MediaItem {
    /// Whether the item is a video, which changes the download variant.
    #[must_use]
    pub fn is_video(&self) -> bool {
        self.mime_type.contains("video")
    }

    /// Full-resolution download URL: `=dv` for videos, `=d` otherwise.
    #[must_use]
    pub fn download_url(&self) -> String {
        if self.is_video() {
            format!("{}=dv", self.base_url)
        } else {
            format!("{}=d", self.base_url)
        }
    }
}

/// An album; only the id is needed to fetch membership.
#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    /// Album identifier, echoed into the item-search request body.
    pub id: String,
}

/// One page of the album-list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumPage {
    /// Albums on this page; the API omits the array entirely when empty.
    #[serde(default)]
    pub albums: Vec<Album>,
    /// Opaque cursor for the next page; absent on the final page.
    pub next_page_token: Option<String>,
}

/// One page of media items, shared by the library-list and album-search
/// endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemPage {
    /// Items on this page; the API omits the array entirely when empty.
    #[serde(default)]
    pub media_items: Vec<MediaItem>,
    /// Opaque cursor for the next page; absent on the final page.
    pub next_page_token: Option<String>,
}

/// Request body for the item-search-by-album endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSearchRequest {
    /// Album whose membership is being listed.
    pub album_id: String,
    /// Requested page size.
    pub page_size: u32,
    /// Cursor echoed from the previous page, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

/// Token endpoint response for both code exchange and refresh.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for API requests.
    pub access_token: String,
    /// Refresh token; only returned on the initial consent exchange.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    /// Space-separated granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_item_parses_from_api_json() {
        let item: MediaItem = serde_json::from_str(
            r#"{
                "id": "abc123",
                "productUrl": "https://photos.google.com/lr/photo/abc123",
                "baseUrl": "https://lh3.googleusercontent.com/x",
                "mimeType": "image/jpeg",
                "filename": "IMG_0001.jpg"
            }"#,
        )
        .unwrap();
        assert_eq!(item.id, "abc123");
        assert_eq!(item.filename, "IMG_0001.jpg");
        assert!(!item.is_video());
    }

    #[test]
    fn download_url_picks_photo_variant() {
        let item = MediaItem {
            id: "1".into(),
            filename: "a.jpg".into(),
            mime_type: "image/jpeg".into(),
            base_url: "https://example.com/base".into(),
        };
        assert_eq!(item.download_url(), "https://example.com/base=d");
    }

    #[test]
    fn download_url_picks_video_variant() {
        let item = MediaItem {
            id: "2".into(),
            filename: "b.mp4".into(),
            mime_type: "video/mp4".into(),
            base_url: "https://example.com/base".into(),
        };
        assert_eq!(item.download_url(), "https://example.com/base=dv");
    }

    #[test]
    fn pages_tolerate_missing_arrays() {
        let page: MediaItemPage = serde_json::from_str("{}").unwrap();
        assert!(page.media_items.is_empty());
        assert!(page.next_page_token.is_none());

        let albums: AlbumPage = serde_json::from_str(r#"{"nextPageToken":"t"}"#).unwrap();
        assert!(albums.albums.is_empty());
        assert_eq!(albums.next_page_token.as_deref(), Some("t"));
    }

    #[test]
    fn search_request_omits_absent_page_token() {
        let body = MediaSearchRequest {
            album_id: "al1".into(),
            page_size: 100,
            page_token: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"albumId":"al1","pageSize":100}"#);

        let body = MediaSearchRequest {
            page_token: Some("tok".into()),
            ..body
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""pageToken":"tok""#));
    }

    #[test]
    fn token_response_without_refresh_token() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"at","expires_in":3599,"token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "at");
        assert!(token.refresh_token.is_none());
        assert_eq!(token.expires_in, 3599);
    }
}
