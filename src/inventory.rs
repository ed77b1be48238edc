//! Builds the two inventories a run needs: the set of item ids that appear
//! in any album, and the full library listing.

use std::collections::HashSet;

use crate::api::ApiClient;
use crate::config::Endpoints;
use crate::error::Result;
use crate::models::{AlbumPage, MediaItem, MediaItemPage, MediaSearchRequest};

/// Page size for the album-list walk.
pub const ALBUM_PAGE_SIZE: u32 = 50;

/// Page size for item walks (library-wide and per-album search).
pub const ITEM_PAGE_SIZE: u32 = 100;

/// Everything discovered about the library in one run.
///
/// `filed_ids` is rebuilt from scratch each run and never persisted;
/// `all_items` preserves the API's return order.
#[derive(Debug, Default)]
pub struct Inventory {
    /// Ids of items referenced by at least one album.
    pub filed_ids: HashSet<String>,
    /// Every item in the library, in API order.
    pub all_items: Vec<MediaItem>,
}

impl Inventory {
    /// Items that belong to no album, in library order.
    #[must_use]
    pub fn unfiled(&self) -> Vec<MediaItem> {
        self.all_items
            .iter()
            .filter(|item| !self.filed_ids.contains(&item.id))
            .cloned()
            .collect()
    }
}

/// Walks albums and the full library, producing the run's [`Inventory`].
///
/// # Errors
///
/// Returns an error if any page request fails; partial inventories are never
/// returned.
pub async fn build(client: &ApiClient, endpoints: &Endpoints) -> Result<Inventory> {
    let filed_ids = collect_filed_ids(client, endpoints).await?;
    let all_items = collect_library(client, endpoints).await?;
    Ok(Inventory {
        filed_ids,
        all_items,
    })
}

/// Enumerates all albums and collects the ids of their members.
async fn collect_filed_ids(client: &ApiClient, endpoints: &Endpoints) -> Result<HashSet<String>> {
    let url = format!("{}/albums", endpoints.api_base);
    let mut filed = HashSet::new();
    let mut album_count = 0_usize;
    let mut page_token: Option<String> = None;

    loop {
        let mut query = vec![("pageSize", ALBUM_PAGE_SIZE.to_string())];
        if let Some(token) = &page_token {
            query.push(("pageToken", token.clone()));
        }
        let page: AlbumPage = client.get(&url, &query).await?;

        album_count += page.albums.len();
        for album in &page.albums {
            collect_album_members(client, endpoints, &album.id, &mut filed).await?;
        }
        log::info!(
            "processed {album_count} album(s), {} filed item(s) so far",
            filed.len()
        );

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(filed)
}

/// Pages through one album's membership, inserting ids into `filed`.
async fn collect_album_members(
    client: &ApiClient,
    endpoints: &Endpoints,
    album_id: &str,
    filed: &mut HashSet<String>,
) -> Result<()> {
    let url = format!("{}/mediaItems:search", endpoints.api_base);
    let mut page_token: Option<String> = None;

    loop {
        let body = MediaSearchRequest {
            album_id: album_id.to_string(),
            page_size: ITEM_PAGE_SIZE,
            page_token: page_token.clone(),
        };
        let page: MediaItemPage = client.post(&url, &body).await?;

        for item in page.media_items {
            filed.insert(item.id);
        }

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(())
}

/// Pages through the whole library, preserving API order.
async fn collect_library(client: &ApiClient, endpoints: &Endpoints) -> Result<Vec<MediaItem>> {
    let url = format!("{}/mediaItems", endpoints.api_base);
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut query = vec![("pageSize", ITEM_PAGE_SIZE.to_string())];
        if let Some(token) = &page_token {
            query.push(("pageToken", token.clone()));
        }
        let page: MediaItemPage = client.get(&url, &query).await?;

        items.extend(page.media_items);
        log::info!("fetched {} library item(s)", items.len());

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json_string, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn item(id: &str) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            filename: format!("{id}.jpg"),
            mime_type: "image/jpeg".to_string(),
            base_url: String::new(),
        }
    }

    fn page_json(ids: &[&str], next: Option<&str>) -> serde_json::Value {
        let mut body = serde_json::json!({
            "mediaItems": ids
                .iter()
                .map(|id| {
                    serde_json::json!({
                        "id": id,
                        "filename": format!("{id}.jpg"),
                        "mimeType": "image/jpeg",
                        "baseUrl": "https://example.com/b"
                    })
                })
                .collect::<Vec<_>>()
        });
        if let Some(token) = next {
            body["nextPageToken"] = serde_json::json!(token);
        }
        body
    }

    fn test_client(dir: &TempDir) -> ApiClient {
        ApiClient::new("tok".to_string(), dir.path().join("token.json"))
    }

    fn test_endpoints(server: &MockServer) -> Endpoints {
        Endpoints {
            api_base: format!("{}/v1", server.uri()),
            ..Endpoints::default()
        }
    }

    // ==================== Unfiled computation ====================

    #[test]
    fn unfiled_is_all_items_minus_filed() {
        let inventory = Inventory {
            filed_ids: HashSet::from(["2".to_string()]),
            all_items: vec![item("1"), item("2"), item("3")],
        };

        let unfiled = inventory.unfiled();
        let ids: Vec<&str> = unfiled.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        // Membership is exactly: in all_items and not filed.
        for candidate in &inventory.all_items {
            let expected = !inventory.filed_ids.contains(&candidate.id);
            assert_eq!(unfiled.iter().any(|i| i.id == candidate.id), expected);
        }
    }

    #[test]
    fn unfiled_preserves_library_order() {
        let inventory = Inventory {
            filed_ids: HashSet::from(["b".to_string()]),
            all_items: vec![item("c"), item("b"), item("a")],
        };
        let unfiled = inventory.unfiled();
        let ids: Vec<&str> = unfiled.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn empty_inventory_has_no_unfiled_items() {
        assert!(Inventory::default().unfiled().is_empty());
    }

    // ==================== Pagination ====================

    #[tokio::test]
    async fn library_walk_follows_tokens_and_stops_on_final_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/mediaItems"))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["1"], Some("A"))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/mediaItems"))
            .and(query_param("pageToken", "A"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["2"], Some("B"))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/mediaItems"))
            .and(query_param("pageToken", "B"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["3"], None)))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let items = collect_library(&test_client(&dir), &test_endpoints(&server))
            .await
            .unwrap();

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        // Mock .expect() counts verify exactly 3 page requests on drop.
    }

    #[tokio::test]
    async fn album_walk_searches_each_album_and_dedups_members() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/albums"))
            .and(query_param("pageSize", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "albums": [{"id": "al1"}, {"id": "al2"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        // Both albums contain item "shared"; al1 also has "only1".
        Mock::given(method("POST"))
            .and(path("/v1/mediaItems:search"))
            .and(body_json_string(r#"{"albumId":"al1","pageSize":100}"#))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_json(&["shared", "only1"], None)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/mediaItems:search"))
            .and(body_json_string(r#"{"albumId":"al2","pageSize":100}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["shared"], None)))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let filed = collect_filed_ids(&test_client(&dir), &test_endpoints(&server))
            .await
            .unwrap();

        assert_eq!(filed, HashSet::from(["shared".to_string(), "only1".to_string()]));
    }

    #[tokio::test]
    async fn album_member_walk_echoes_page_tokens_in_the_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/mediaItems:search"))
            .and(body_json_string(r#"{"albumId":"al1","pageSize":100}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["x"], Some("T"))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/mediaItems:search"))
            .and(body_json_string(r#"{"albumId":"al1","pageSize":100,"pageToken":"T"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["y"], None)))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let mut filed = HashSet::new();
        collect_album_members(&test_client(&dir), &test_endpoints(&server), "al1", &mut filed)
            .await
            .unwrap();
        assert_eq!(filed, HashSet::from(["x".to_string(), "y".to_string()]));
    }

    #[tokio::test]
    async fn no_albums_means_no_filed_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/albums"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let filed = collect_filed_ids(&test_client(&dir), &test_endpoints(&server))
            .await
            .unwrap();
        assert!(filed.is_empty());
    }
}
