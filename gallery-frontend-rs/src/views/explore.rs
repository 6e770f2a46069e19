use std::{collections::HashMap, rc::Rc};

use chrono::{DateTime, Duration, Utc};
use stash::KeyValueStore;

use crate::api::{ItemQuery, Transport};
use crate::error::GalleryError;
use crate::list::OptimisticList;
use crate::models::Artwork;
use crate::reconcile::Reconciler;

const FEATURED: usize = 6;
const TOP_ARTISTS: usize = 6;
const HIGHLIGHTS: usize = 3;

#[derive(serde::Serialize, serde::Deserialize, tsify::Tsify, Debug, Clone, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    pub artist_name: String,
    pub initials: String,
    pub count: u32,
    pub likes: u64,
    pub sample_image: String,
}

/// The home page sections, derived from the full artwork list.
#[derive(serde::Serialize, serde::Deserialize, tsify::Tsify, Debug, Clone, PartialEq, Default)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct HomeFeed {
    pub featured: Vec<Artwork>,
    /// By total likes on artworks from the past week.
    pub top_artists: Vec<ArtistSummary>,
    /// By likes, from the past two weeks.
    pub highlights: Vec<Artwork>,
}

impl HomeFeed {
    pub fn build(artworks: &[Artwork], now: DateTime<Utc>) -> Self {
        // Undated artworks sort as the oldest.
        let created = |a: &Artwork| a.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let mut newest = artworks.to_vec();
        newest.sort_by_key(|a| std::cmp::Reverse(created(a)));

        let week_ago = now - Duration::days(7);
        let mut artists: Vec<ArtistSummary> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for artwork in newest.iter().filter(|a| created(a) >= week_ago) {
            let name = artwork.artist_or_unknown();
            let index = *by_name.entry(name.to_string()).or_insert_with(|| {
                artists.push(ArtistSummary {
                    artist_name: name.to_string(),
                    initials: initials(name),
                    count: 0,
                    likes: 0,
                    sample_image: String::new(),
                });
                artists.len() - 1
            });
            let summary = &mut artists[index];
            summary.count += 1;
            summary.likes = summary.likes.saturating_add(artwork.likes);
            if summary.sample_image.is_empty() {
                summary.sample_image = artwork.image_ref().to_string();
            }
        }
        artists.sort_by_key(|a| std::cmp::Reverse(a.likes));
        artists.truncate(TOP_ARTISTS);

        let two_weeks_ago = now - Duration::days(14);
        let mut highlights: Vec<Artwork> = newest
            .iter()
            .filter(|a| created(a) >= two_weeks_ago)
            .cloned()
            .collect();
        highlights.sort_by_key(|a| std::cmp::Reverse(a.likes));
        highlights.truncate(HIGHLIGHTS);

        newest.truncate(FEATURED);
        HomeFeed {
            featured: newest,
            top_artists: artists,
            highlights,
        }
    }
}

/// `999`, `1.2k`, `3.4M`.
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// First letters of the first two space-separated words, uppercased. `A` when there are none.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split(' ')
        .take(2)
        .filter_map(|word| word.chars().next())
        .collect();
    if letters.is_empty() {
        "A".to_string()
    } else {
        letters.to_uppercase()
    }
}

/// Every artwork, plus the home feed computed from them.
pub struct ExploreView<T, S> {
    reconciler: Rc<Reconciler<T, S>>,
    artworks: OptimisticList<Artwork>,
}

impl<T: Transport, S: KeyValueStore> ExploreView<T, S> {
    pub fn new(reconciler: Rc<Reconciler<T, S>>) -> Self {
        Self {
            reconciler,
            artworks: OptimisticList::default(),
        }
    }

    pub fn artworks(&self) -> Vec<Artwork> {
        self.artworks.to_vec()
    }

    pub async fn load(&self) -> Result<Vec<Artwork>, GalleryError> {
        let artworks = self
            .reconciler
            .api()
            .list_items(&ItemQuery::default())
            .await?;
        self.artworks.replace(artworks.iter().cloned());
        Ok(artworks)
    }

    pub fn home_feed(&self, now: DateTime<Utc>) -> HomeFeed {
        HomeFeed::build(&self.artworks.to_vec(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artwork(id: &str, artist: &str, likes: u64, days_old: i64, now: DateTime<Utc>) -> Artwork {
        Artwork {
            id: id.into(),
            artist_name: artist.into(),
            image_url: format!("{id}.png"),
            likes,
            created_at: Some(now - Duration::days(days_old)),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_200), "1.2k");
        assert_eq!(format_count(3_400_000), "3.4M");
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("ana maria lopez"), "AM");
        assert_eq!(initials("bo"), "B");
        assert_eq!(initials(""), "A");
    }

    #[test]
    fn test_home_feed_sections() {
        let now = DateTime::from_timestamp(1_750_000_000, 0).unwrap();
        let artworks = vec![
            artwork("old", "Ana", 500, 30, now),
            artwork("mid", "Bo", 40, 10, now),
            artwork("new1", "Ana", 5, 1, now),
            artwork("new2", "Cy", 9, 2, now),
            artwork("new3", "", 1, 3, now),
            Artwork {
                id: "undated".into(),
                likes: 1000,
                ..Default::default()
            },
        ];

        let feed = HomeFeed::build(&artworks, now);

        let featured: Vec<_> = feed.featured.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(featured, ["new1", "new2", "new3", "mid", "old", "undated"]);

        let artists: Vec<_> = feed
            .top_artists
            .iter()
            .map(|a| (a.artist_name.as_str(), a.likes))
            .collect();
        assert_eq!(artists, [("Cy", 9), ("Ana", 5), ("Unknown Artist", 1)]);
        assert_eq!(feed.top_artists[2].initials, "UA");

        let highlights: Vec<_> = feed.highlights.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(highlights, ["mid", "new2", "new1"]);
    }
}
