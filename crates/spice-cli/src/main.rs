//! # spice: command-line client for spice-hub
//!
//! - `spice search --day Friday --location Brickell`: search restaurants.
//! - `spice reviews "Joe's Stone Crab"`: review summary of one restaurant.
//! - `spice review --restaurant Zuma --user Ann --rating 9`: submit a review.
//! - `spice stats`: per-operation timings.
//!
//! The server address comes from `SPICE_BASE_URL`.

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use spice_core::{DiningOption, Restaurant, Review};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Browse restaurants and reviews served by spice-hub.
#[derive(Parser)]
#[command(name = "spice", version, about, long_about = None)]
struct Cli {
    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search restaurants. Every criterion is optional.
    Search {
        /// Substring of the restaurant name.
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        cuisine: Option<String>,
        #[arg(long)]
        day: Option<String>,
        #[arg(long)]
        time: Option<String>,
        /// May be given more than once.
        #[arg(long = "location")]
        locations: Vec<String>,
        /// Substring of a reviewer's user name.
        #[arg(long)]
        reviewer: Option<String>,
    },

    /// List every restaurant.
    Restaurants,

    /// Dining options of one restaurant.
    Options {
        id: i64,
        #[arg(long)]
        day: Option<String>,
        #[arg(long)]
        time: Option<String>,
    },

    /// Values available for each search criterion.
    Filters,

    /// Reviews of one restaurant, by exact name.
    Reviews { restaurant: String },

    /// Reviews written by users whose name contains the given text.
    User {
        #[arg(default_value = "")]
        name: String,
    },

    /// Submit a review.
    Review {
        #[arg(long)]
        restaurant: String,
        #[arg(long)]
        user: String,
        /// 1 to 10.
        #[arg(long)]
        rating: i32,
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Check store connectivity.
    Health,

    /// Operation timings.
    Stats {
        /// Clear the statistics after printing them.
        #[arg(long)]
        reset: bool,
    },
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Deserialize, Debug)]
struct ApiError {
    error: String,
}

#[derive(Deserialize, Debug)]
struct FilterData {
    restaurants: Vec<String>,
    cuisines: Vec<String>,
    locations: Vec<String>,
    days: Vec<String>,
    times: Vec<String>,
    users: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct RestaurantReviews {
    reviews: Vec<Review>,
    avg_rating: Option<f64>,
    total_reviews: usize,
}

#[derive(Deserialize, Debug)]
struct UserReview {
    restaurant_name: String,
    rating: i32,
    comment: String,
    created_at: String,
}

#[derive(Deserialize, Debug)]
struct SubmitOutcome {
    status: String,
    message: String,
}

#[derive(Deserialize, Debug)]
struct HealthReport {
    status: String,
    message: Option<String>,
    collections: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct OperationSummary {
    count: u64,
    errors: u64,
    avg_time_ms: f64,
    min_time_ms: f64,
    max_time_ms: f64,
    error_rate: f64,
}

#[derive(Deserialize, Debug)]
struct SlowQuery {
    query: String,
    time_ms: f64,
    timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Deserialize, Debug)]
struct Metrics {
    total_queries: u64,
    slow_queries_count: usize,
    slow_threshold_ms: f64,
    query_stats: std::collections::BTreeMap<String, OperationSummary>,
    slow_queries: Vec<SlowQuery>,
}

// =============================================================================
// Table rows
// =============================================================================

#[derive(Tabled)]
struct RestaurantRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Cuisine")]
    cuisine: String,
    #[tabled(rename = "Location")]
    location: String,
}

impl From<&Restaurant> for RestaurantRow {
    fn from(r: &Restaurant) -> Self {
        Self {
            id: r.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
            name: r.name.clone(),
            cuisine: r.cuisine.clone().unwrap_or_default(),
            location: r.location.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct OptionRow {
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Price")]
    price: String,
}

#[derive(Tabled)]
struct ReviewRow {
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "Comment")]
    comment: String,
    #[tabled(rename = "Posted")]
    posted: String,
}

#[derive(Tabled)]
struct UserReviewRow {
    #[tabled(rename = "Restaurant")]
    restaurant: String,
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "Comment")]
    comment: String,
    #[tabled(rename = "Posted")]
    posted: String,
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Operation")]
    operation: String,
    #[tabled(rename = "Count")]
    count: u64,
    #[tabled(rename = "Avg ms")]
    avg: f64,
    #[tabled(rename = "Min ms")]
    min: f64,
    #[tabled(rename = "Max ms")]
    max: f64,
    #[tabled(rename = "Errors")]
    errors: u64,
    #[tabled(rename = "Error %")]
    error_rate: f64,
}

fn table<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// `7/10 ★★★★★★★☆☆☆`
fn stars(rating: i32) -> String {
    let filled = rating.clamp(0, 10) as usize;
    format!("{rating}/10 {}{}", "★".repeat(filled), "☆".repeat(10 - filled))
}

fn average_line(summary: &RestaurantReviews) -> String {
    match summary.avg_rating {
        Some(avg) => format!(
            "Average rating: {avg:.1}/10 from {} review(s)",
            summary.total_reviews
        ),
        None => "No reviews yet".to_string(),
    }
}

// =============================================================================
// Main
// =============================================================================

fn main() {
    let cli = Cli::parse();

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to build tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(async_main(cli)) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn async_main(cli: Cli) -> Result<(), String> {
    let client = reqwest::Client::new();
    let base_url = std::env::var("SPICE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let base_url = base_url.trim_end_matches('/');
    let json = cli.json;

    match cli.command {
        Commands::Search {
            name,
            cuisine,
            day,
            time,
            locations,
            reviewer,
        } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            let singles = [
                ("name", name),
                ("cuisine", cuisine),
                ("day", day),
                ("time", time),
                ("reviewer", reviewer),
            ];
            for (key, value) in singles {
                if let Some(value) = value {
                    query.push((key, value));
                }
            }
            for location in locations {
                query.push(("location", location));
            }

            let url = format!("{}/api/restaurants/search", base_url);
            let found: Vec<Restaurant> = get_json(&client, &url, &query).await?;
            print_restaurants(json, &found)
        }

        Commands::Restaurants => {
            let url = format!("{}/api/restaurants", base_url);
            let all: Vec<Restaurant> = get_json(&client, &url, &[]).await?;
            print_restaurants(json, &all)
        }

        Commands::Options { id, day, time } => {
            let mut query = Vec::new();
            if let Some(day) = day {
                query.push(("day", day));
            }
            if let Some(time) = time {
                query.push(("time", time));
            }
            let url = format!("{}/api/restaurants/{}/options", base_url, id);
            let options: Vec<DiningOption> = get_json(&client, &url, &query).await?;
            if json {
                return print_json(&options);
            }
            let rows: Vec<OptionRow> = options
                .iter()
                .map(|o| OptionRow {
                    day: o.day.to_string(),
                    time: o.time.to_string(),
                    price: o.price.clone(),
                })
                .collect();
            println!("{}", table(rows));
            Ok(())
        }

        Commands::Filters => {
            let url = format!("{}/api/filters", base_url);
            let data: FilterData = get_json(&client, &url, &[]).await?;
            if json {
                return print_json(&serde_json::json!({
                    "restaurants": data.restaurants,
                    "cuisines": data.cuisines,
                    "locations": data.locations,
                    "days": data.days,
                    "times": data.times,
                    "users": data.users,
                }));
            }
            println!("Restaurants: {}", data.restaurants.len());
            println!("Cuisines:    {}", data.cuisines.join(", "));
            println!("Locations:   {}", data.locations.join(", "));
            println!("Days:        {}", data.days.join(", "));
            println!("Times:       {}", data.times.join(", "));
            println!("Reviewers:   {}", data.users.join(", "));
            Ok(())
        }

        Commands::Reviews { restaurant } => {
            let mut url = reqwest::Url::parse(base_url).map_err(|e| e.to_string())?;
            url.path_segments_mut()
                .map_err(|_| format!("{} cannot be a base URL", base_url))?
                .pop_if_empty()
                .extend(["api", "reviews", "restaurant", restaurant.as_str()]);

            let summary: RestaurantReviews = get_json(&client, url.as_str(), &[]).await?;
            if json {
                let reviews = serde_json::to_value(&summary.reviews).map_err(|e| e.to_string())?;
                return print_json(&serde_json::json!({
                    "reviews": reviews,
                    "avg_rating": summary.avg_rating,
                    "total_reviews": summary.total_reviews,
                }));
            }
            println!("{}", restaurant);
            println!("{}", average_line(&summary));
            if !summary.reviews.is_empty() {
                let rows: Vec<ReviewRow> = summary
                    .reviews
                    .iter()
                    .map(|r| ReviewRow {
                        user: r.user_name.clone(),
                        rating: stars(r.rating),
                        comment: r.comment.clone(),
                        posted: r
                            .created_at
                            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default(),
                    })
                    .collect();
                println!("{}", table(rows));
            }
            Ok(())
        }

        Commands::User { name } => {
            let url = format!("{}/api/reviews/user", base_url);
            let history: Vec<UserReview> = get_json(&client, &url, &[("q", name)]).await?;
            if json {
                let rows: Vec<_> = history
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "restaurant_name": r.restaurant_name,
                            "rating": r.rating,
                            "comment": r.comment,
                            "created_at": r.created_at,
                        })
                    })
                    .collect();
                return print_json(&rows);
            }
            let rows: Vec<UserReviewRow> = history
                .into_iter()
                .map(|r| UserReviewRow {
                    restaurant: r.restaurant_name,
                    rating: stars(r.rating),
                    comment: r.comment,
                    posted: r.created_at,
                })
                .collect();
            println!("{}", table(rows));
            Ok(())
        }

        Commands::Review {
            restaurant,
            user,
            rating,
            comment,
        } => {
            let url = format!("{}/api/reviews", base_url);
            let payload = serde_json::json!({
                "restaurant_name": restaurant,
                "user_name": user,
                "rating": rating,
                "comment": comment,
            });
            let resp = post_request(&client, &url, &payload)
                .await
                .map_err(|e| e.to_string())?;
            // 404 and 409 carry a submit outcome; anything else is an error body.
            let status = resp.status();
            let has_outcome = status.is_success()
                || status == reqwest::StatusCode::NOT_FOUND
                || status == reqwest::StatusCode::CONFLICT;
            if !has_outcome {
                return Err(error_message(resp).await);
            }
            let outcome: SubmitOutcome = resp.json().await.map_err(|e| e.to_string())?;
            println!("{} ({})", outcome.message, outcome.status);
            Ok(())
        }

        Commands::Health => {
            let url = format!("{}/api/health", base_url);
            let resp = get_request(&client, &url, &[])
                .await
                .map_err(|e| e.to_string())?;
            let report: HealthReport = resp.json().await.map_err(|e| e.to_string())?;
            println!("Status:      {}", report.status);
            if let Some(message) = report.message {
                println!("Message:     {}", message);
            }
            println!("Collections: {}", report.collections.join(", "));
            Ok(())
        }

        Commands::Stats { reset } => {
            let url = format!("{}/api/metrics", base_url);
            let metrics: Metrics = get_json(&client, &url, &[]).await?;
            print_stats(&metrics);

            if reset {
                client
                    .delete(&url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| e.to_string())?;
                println!("Statistics reset.");
            }
            Ok(())
        }
    }
}

fn print_restaurants(json: bool, restaurants: &[Restaurant]) -> Result<(), String> {
    if json {
        return print_json(&restaurants);
    }
    let rows: Vec<RestaurantRow> = restaurants.iter().map(RestaurantRow::from).collect();
    println!("{}", table(rows));
    println!("{} restaurant(s)", restaurants.len());
    Ok(())
}

fn print_stats(metrics: &Metrics) {
    println!("Total operations: {}", metrics.total_queries);
    println!(
        "Slow operations (>{}ms): {}",
        metrics.slow_threshold_ms, metrics.slow_queries_count
    );
    if metrics.query_stats.is_empty() {
        println!("No operations recorded yet");
        return;
    }

    let rows: Vec<StatRow> = metrics
        .query_stats
        .iter()
        .map(|(operation, s)| StatRow {
            operation: operation.clone(),
            count: s.count,
            avg: s.avg_time_ms,
            min: s.min_time_ms,
            max: s.max_time_ms,
            errors: s.errors,
            error_rate: s.error_rate,
        })
        .collect();
    println!("{}", table(rows));

    // Last five only
    let recent = metrics.slow_queries.iter().rev().take(5);
    for q in recent {
        println!(
            "  {} {}: {:.3}s",
            q.timestamp.format("%H:%M:%S"),
            q.query,
            q.time_ms / 1000.0
        );
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

async fn get_request(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<reqwest::Response, reqwest::Error> {
    client.get(url).query(query).send().await
}

async fn post_request(
    client: &reqwest::Client,
    url: &str,
    json: &serde_json::Value,
) -> Result<reqwest::Response, reqwest::Error> {
    client.post(url).json(json).send().await
}

async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, String> {
    let resp = get_request(client, url, query)
        .await
        .map_err(|e| e.to_string())?;
    if !resp.status().is_success() {
        return Err(error_message(resp).await);
    }
    resp.json::<T>().await.map_err(|e| e.to_string())
}

async fn error_message(resp: reqwest::Response) -> String {
    let status = resp.status();
    match resp.json::<ApiError>().await {
        Ok(body) => format!("{}: {}", status, body.error),
        Err(_) => status.to_string(),
    }
}
