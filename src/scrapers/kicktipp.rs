use crate::betting::{MatchRow, TipField};
use crate::models::{Match, KICKOFF_FORMAT};
use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::warn;

const URL_BASE: &str = "https://www.kicktipp.de";
const URL_LOGIN: &str = "https://www.kicktipp.de/info/profil/login";
const URL_COMMUNITIES: &str = "https://www.kicktipp.de/info/profil/meinetipprunden";

/// The bet form as scraped from the page: its submit URL plus every input's
/// current name/value pair. Submission re-posts all of them with the
/// computed tips merged in.
#[derive(Debug, Clone)]
pub struct TippForm {
    pub action: Url,
    pub fields: Vec<(String, String)>,
}

/// Session client for the kicktipp website. Keeps the login cookie in a
/// shared jar so a token can be extracted and reused across runs.
pub struct KicktippClient {
    client: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
}

impl KicktippClient {
    pub fn new() -> Self {
        let jar = Arc::new(Jar::default());
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
                .cookie_provider(jar.clone())
                .build()
                .unwrap(),
            jar,
            base: Url::parse(URL_BASE).unwrap(),
        }
    }

    /// Log in with the account credentials and return the session token for
    /// later reuse.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let form = [("kennung", username), ("passwort", password)];
        self.client
            .post(URL_LOGIN)
            .form(&form)
            .send()
            .await
            .context("Failed to submit kicktipp login form")?;

        self.login_token()
            .context("Login failed, email or password incorrect")
    }

    /// The value of the session cookie, once logged in.
    pub fn login_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let cookies = header.to_str().ok()?.to_string();
        cookies
            .split("; ")
            .find_map(|cookie| cookie.strip_prefix("login="))
            .map(str::to_string)
    }

    /// Reuse a previously issued session token instead of logging in.
    pub fn use_login_token(&self, token: &str) {
        let cookie = format!("login={}; Domain=kicktipp.de; Path=/", token);
        self.jar.add_cookie_str(&cookie, &self.base);
    }

    /// All prediction game communities of the account, in site order,
    /// intersected with `desired` when that is non-empty.
    pub async fn fetch_communities(&self, desired: &[String]) -> Result<Vec<String>> {
        let html = self
            .client
            .get(URL_COMMUNITIES)
            .send()
            .await
            .context("Failed to fetch the community overview")?
            .text()
            .await?;

        let communities = parse_communities(&html)?;
        if desired.is_empty() {
            return Ok(communities);
        }
        Ok(communities
            .into_iter()
            .filter(|community| desired.contains(community))
            .collect())
    }

    /// Fetch the bet form of a community: the raw form for resubmission and
    /// one row per listed match.
    pub async fn fetch_match_rows(&self, community: &str) -> Result<(TippForm, Vec<MatchRow>)> {
        let url = self.base.join(&format!("{}/tippabgabe", community))?;
        let html = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch the bet page of {}", community))?
            .text()
            .await?;

        parse_tippabgabe(&html, &url)
    }

    /// Submit all field assignments as one batched form post.
    pub async fn submit_tips(&self, form: &TippForm, assignments: &[(String, String)]) -> Result<()> {
        let mut fields = form.fields.clone();
        for (name, value) in assignments {
            match fields.iter_mut().find(|(field, _)| field == name) {
                Some(entry) => entry.1 = value.clone(),
                None => fields.push((name.clone(), value.clone())),
            }
        }
        fields.push(("submitbutton".to_string(), String::new()));

        let response = self
            .client
            .post(form.action.clone())
            .form(&fields)
            .send()
            .await
            .context("Failed to submit the bet form")?;

        if !response.status().is_success() {
            bail!("Bet submission returned {}", response.status());
        }
        Ok(())
    }
}

impl Default for KicktippClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the community names from the overview page. A link counts as a
/// community when its href (stripped of slashes) equals either the link
/// text or the text of its tippglocke title div.
fn parse_communities(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let content_sel = Selector::parse("#kicktipp-content")
        .ok()
        .context("Invalid content selector")?;
    let link_sel = Selector::parse("a").ok().context("Invalid link selector")?;
    let title_sel = Selector::parse("div.menu-title-mit-tippglocke")
        .ok()
        .context("Invalid title selector")?;

    let content = document
        .select(&content_sel)
        .next()
        .context("No content area found on the community overview")?;

    let mut communities = Vec::new();
    for link in content.select(&link_sel) {
        let href = match link.value().attr("href") {
            Some(href) => href,
            None => continue,
        };
        let name = href.replace('/', "");
        if name.is_empty() {
            continue;
        }

        let link_text = link.text().collect::<String>();
        let title_text = link
            .select(&title_sel)
            .next()
            .map(|div| div.text().collect::<String>());
        if link_text == name || title_text.as_deref() == Some(name.as_str()) {
            communities.push(name);
        }
    }
    Ok(communities)
}

/// Parse the tippabgabe page into the resubmittable form and its match
/// rows.
fn parse_tippabgabe(html: &str, page_url: &Url) -> Result<(TippForm, Vec<MatchRow>)> {
    let document = Html::parse_document(html);
    let content_sel = Selector::parse("#kicktipp-content")
        .ok()
        .context("Invalid content selector")?;
    let form_sel = Selector::parse("form").ok().context("Invalid form selector")?;
    let input_sel = Selector::parse("input").ok().context("Invalid input selector")?;
    let row_sel = Selector::parse("tbody tr").ok().context("Invalid row selector")?;

    let content = document
        .select(&content_sel)
        .next()
        .context("No content area found on the bet page")?;
    let form_elem = content
        .select(&form_sel)
        .next()
        .context("No bet form found")?;

    let mut fields = Vec::new();
    for input in form_elem.select(&input_sel) {
        if let Some(name) = input.value().attr("name") {
            let value = input.value().attr("value").unwrap_or("");
            fields.push((name.to_string(), value.to_string()));
        }
    }

    let action = match form_elem.value().attr("action") {
        Some(action) if !action.is_empty() => {
            page_url.join(action).context("Invalid form action")?
        }
        _ => page_url.clone(),
    };

    let mut rows = Vec::new();
    let mut last_kickoff: Option<NaiveDateTime> = None;
    for row in content.select(&row_sel) {
        match parse_match_row(&row, last_kickoff) {
            Some(match_row) => {
                last_kickoff = match_row.fixture.kickoff;
                rows.push(match_row);
            }
            None => {
                warn!(
                    "skipping unparsable bet row: {}",
                    row.text().collect::<String>().trim()
                );
            }
        }
    }

    Ok((TippForm { action, fields }, rows))
}

/// Parse one tippabgabe table row: date, teams, tip inputs and the three
/// odds cells. Rows that do not carry a complete match are skipped by
/// returning None. A row without a date cell inherits the kickoff of the
/// previous row.
fn parse_match_row(row: &ElementRef, last_kickoff: Option<NaiveDateTime>) -> Option<MatchRow> {
    let cell_sel = Selector::parse("td").ok()?;
    let input_sel = Selector::parse("input").ok()?;

    let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
    if cells.len() < 7 {
        return None;
    }

    let home_team = cell_text(&cells[1]);
    let road_team = cell_text(&cells[2]);
    let odds_home = cell_text(&cells[4]).parse::<f64>().ok()?;
    let odds_draw = cell_text(&cells[5]).parse::<f64>().ok()?;
    let odds_road = cell_text(&cells[6]).parse::<f64>().ok()?;

    let kickoff = NaiveDateTime::parse_from_str(&cell_text(&cells[0]), KICKOFF_FORMAT)
        .ok()
        .or(last_kickoff);

    let fixture = Match::new(home_team, road_team, kickoff, odds_home, odds_draw, odds_road).ok()?;

    let mut home_field = None;
    let mut road_field = None;
    for input in row.select(&input_sel) {
        let id = input.value().attr("id").unwrap_or("");
        let name = match input.value().attr("name") {
            Some(name) => name.to_string(),
            None => continue,
        };
        let value = input
            .value()
            .attr("value")
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        if id.ends_with("_heimTipp") {
            home_field = Some(TipField { name, value });
        } else if id.ends_with("_gastTipp") {
            road_field = Some(TipField { name, value });
        }
    }

    Some(MatchRow {
        home_field,
        road_field,
        fixture,
    })
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}
