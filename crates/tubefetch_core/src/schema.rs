use crate::{WorkItem, FAILED};

/// Accepted headers for the artist column, matched case-insensitively.
pub const ARTIST_COLUMNS: &[&str] = &["Artist Name(s)", "Artist"];
/// Accepted headers for the track column, matched case-insensitively.
pub const TRACK_COLUMNS: &[&str] = &["Track Name", "Track"];
pub const QUERY_COLUMN: &str = "query";
pub const URL_COLUMN: &str = "url";

/// Flat table as read from disk: one header row and string cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first header equal to any of `names`, ignoring case and
    /// surrounding whitespace.
    pub fn column_index(&self, names: &[&str]) -> Option<usize> {
        self.headers.iter().position(|header| {
            let header = header.trim();
            names.iter().any(|name| header.eq_ignore_ascii_case(name))
        })
    }

    /// Trimmed cell text; short rows read as empty cells.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(|cell| cell.trim())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Playlist export with artist and track columns.
    ArtistTrack { has_url: bool },
    /// Only a link column; nothing to resolve.
    LinksOnly,
    /// Free-text query column, e.g. a failed table or an earlier links table.
    Queries { has_url: bool },
    Unrecognized,
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    artist: Option<usize>,
    track: Option<usize>,
    query: Option<usize>,
    url: Option<usize>,
}

impl Columns {
    fn locate(table: &Table) -> Self {
        Self {
            artist: table.column_index(ARTIST_COLUMNS),
            track: table.column_index(TRACK_COLUMNS),
            query: table.column_index(&[QUERY_COLUMN]),
            url: table.column_index(&[URL_COLUMN]),
        }
    }

    fn kind(&self) -> InputKind {
        let has_url = self.url.is_some();
        if self.artist.is_some() && self.track.is_some() {
            InputKind::ArtistTrack { has_url }
        } else if self.query.is_some() {
            InputKind::Queries { has_url }
        } else if has_url {
            InputKind::LinksOnly
        } else {
            InputKind::Unrecognized
        }
    }
}

/// Decide from the header row alone which phases a table can feed.
pub fn classify(table: &Table) -> InputKind {
    Columns::locate(table).kind()
}

/// Which links count as usable resolution results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPolicy {
    pub host_token: String,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            host_token: "youtube".to_string(),
        }
    }
}

impl LinkPolicy {
    pub fn new(host_token: impl Into<String>) -> Self {
        Self {
            host_token: host_token.into(),
        }
    }

    pub fn is_valid(&self, link: &str) -> bool {
        let link = link.trim();
        link.starts_with("http")
            && link
                .to_lowercase()
                .contains(&self.host_token.to_lowercase())
    }
}

/// A row needs resolution iff its link is empty, the sentinel, or invalid.
pub fn needs_resolution(link: &str, policy: &LinkPolicy) -> bool {
    let link = link.trim();
    link.is_empty() || link == FAILED || !policy.is_valid(link)
}

pub fn build_query(artist: &str, track: &str) -> String {
    format!("{} - {}", artist.trim(), track.trim())
}

/// Work derived from one input table, computed once before any phase runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPlan {
    pub kind: InputKind,
    /// Queries still lacking a valid link, in input order.
    pub residual: Vec<WorkItem>,
    /// Links already present and valid, in input order.
    pub valid_links: Vec<WorkItem>,
    /// Link cells dropped as malformed in a links-only table.
    pub rejected_links: usize,
    /// Rows with nothing to query (blank artist and track, or blank query).
    pub blank_rows: usize,
}

/// Split a table into its residual set and its already valid links.
pub fn plan(table: &Table, policy: &LinkPolicy) -> ResolutionPlan {
    let columns = Columns::locate(table);
    let kind = columns.kind();
    let mut plan = ResolutionPlan {
        kind,
        residual: Vec::new(),
        valid_links: Vec::new(),
        rejected_links: 0,
        blank_rows: 0,
    };

    let link_at = |row: usize| columns.url.map(|col| table.cell(row, col)).unwrap_or("");

    for row in 0..table.len() {
        let query = match (kind, columns) {
            (
                InputKind::ArtistTrack { .. },
                Columns {
                    artist: Some(artist),
                    track: Some(track),
                    ..
                },
            ) => {
                let (artist, track) = (table.cell(row, artist), table.cell(row, track));
                if artist.is_empty() && track.is_empty() {
                    None
                } else {
                    Some(build_query(artist, track))
                }
            }
            (InputKind::Queries { .. }, Columns { query: Some(col), .. }) => {
                Some(table.cell(row, col).to_string()).filter(|q| !q.is_empty())
            }
            (InputKind::LinksOnly, _) => {
                let link = link_at(row);
                if policy.is_valid(link) {
                    plan.valid_links.push(WorkItem::new(row, link));
                } else {
                    plan.rejected_links += 1;
                }
                continue;
            }
            _ => continue,
        };

        let link = link_at(row);
        if !needs_resolution(link, policy) {
            plan.valid_links.push(WorkItem::new(row, link));
            continue;
        }
        match query {
            Some(query) => plan.residual.push(WorkItem::new(row, query)),
            None => plan.blank_rows += 1,
        }
    }

    plan
}
