use chrono::NaiveDate;
use movie_desk::datetime_tools::DateTimeTools;
use movie_desk::discover::{DiscoverArgs, DiscoverQuery};
use movie_desk::error::{ToolError, ToolResult};
use movie_desk::movie_tools::MovieTools;
use movie_desk::registry::{build_registry, ToolRegistry};
use movie_desk::tmdb::{
    TmdbApi, TmdbCastMember, TmdbCredits, TmdbExternalIds, TmdbGenre, TmdbKeyword,
    TmdbMovieDetail, TmdbMovieSummary, TmdbPerson, TmdbVideo,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeTmdb {
    details: HashMap<i32, TmdbMovieDetail>,
    videos: HashMap<i32, Vec<TmdbVideo>>,
    credits: HashMap<i32, TmdbCredits>,
    imdb: HashMap<i32, String>,
    search_results: Vec<TmdbMovieSummary>,
    discover_results: Vec<TmdbMovieSummary>,
    fail_external_ids_for: Option<i32>,
    calls: Mutex<Vec<String>>,
    searches: Mutex<Vec<(String, Option<i32>)>>,
    queries: Mutex<Vec<DiscoverQuery>>,
}

impl FakeTmdb {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TmdbApi for FakeTmdb {
    async fn movie_genres(&self) -> ToolResult<Vec<TmdbGenre>> {
        self.record("genres".to_string());
        Ok(vec![
            TmdbGenre {
                id: 28,
                name: "Action".to_string(),
            },
            TmdbGenre {
                id: 12,
                name: "Adventure".to_string(),
            },
        ])
    }

    async fn search_person(&self, name: &str) -> ToolResult<Vec<TmdbPerson>> {
        self.record(format!("person:{name}"));
        Ok(vec![TmdbPerson {
            id: 6193,
            name: "Leonardo DiCaprio".to_string(),
        }])
    }

    async fn search_movie(&self, title: &str, year: Option<i32>) -> ToolResult<Vec<TmdbMovieSummary>> {
        self.record(format!("search:{title}"));
        self.searches.lock().unwrap().push((title.to_string(), year));
        Ok(self.search_results.clone())
    }

    async fn movie_external_ids(&self, id: i32) -> ToolResult<TmdbExternalIds> {
        self.record(format!("external_ids:{id}"));
        if self.fail_external_ids_for == Some(id) {
            return Err(ToolError::service("upstream timeout"));
        }
        Ok(TmdbExternalIds {
            imdb_id: self.imdb.get(&id).cloned(),
        })
    }

    async fn movie(&self, id: i32) -> ToolResult<TmdbMovieDetail> {
        self.record(format!("movie:{id}"));
        self.details
            .get(&id)
            .cloned()
            .ok_or_else(|| ToolError::NotFound(format!("/movie/{id}")))
    }

    async fn movie_videos(&self, id: i32) -> ToolResult<Vec<TmdbVideo>> {
        self.record(format!("videos:{id}"));
        Ok(self.videos.get(&id).cloned().unwrap_or_default())
    }

    async fn movie_credits(&self, id: i32) -> ToolResult<TmdbCredits> {
        self.record(format!("credits:{id}"));
        self.credits
            .get(&id)
            .cloned()
            .ok_or_else(|| ToolError::service("credits unavailable"))
    }

    async fn search_keyword(&self, term: &str) -> ToolResult<Vec<TmdbKeyword>> {
        self.record(format!("keyword:{term}"));
        Ok(vec![TmdbKeyword {
            id: 9715,
            name: "superhero".to_string(),
        }])
    }

    async fn discover_movies(&self, query: &DiscoverQuery) -> ToolResult<Vec<TmdbMovieSummary>> {
        self.record("discover".to_string());
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.discover_results.clone())
    }
}

fn summary(id: i32, title: &str, date: Option<&str>) -> TmdbMovieSummary {
    TmdbMovieSummary {
        id,
        title: title.to_string(),
        release_date: date.map(str::to_string),
    }
}

fn video(name: &str, kind: &str, official: bool) -> TmdbVideo {
    TmdbVideo {
        name: name.to_string(),
        key: format!("k_{name}"),
        site: "YouTube".to_string(),
        video_type: kind.to_string(),
        official,
    }
}

fn inception() -> TmdbMovieDetail {
    TmdbMovieDetail {
        id: 27205,
        title: "Inception".to_string(),
        overview: Some("A thief who steals corporate secrets.".to_string()),
        release_date: Some("2010-07-15".to_string()),
        genres: vec![TmdbGenre {
            id: 28,
            name: "Action".to_string(),
        }],
        runtime: Some(148),
        vote_average: Some(8.4),
        vote_count: Some(35000),
        imdb_id: Some("tt1375666".to_string()),
        poster_path: Some("/poster.jpg".to_string()),
        backdrop_path: None,
        tagline: Some("Your mind is the scene of the crime.".to_string()),
        original_language: Some("en".to_string()),
    }
}

fn catalog() -> FakeTmdb {
    FakeTmdb {
        details: HashMap::from([(27205, inception())]),
        videos: HashMap::from([(
            27205,
            vec![
                video("teaser", "Teaser", true),
                video("fan", "Trailer", false),
                video("official", "Trailer", true),
                TmdbVideo {
                    site: "Vimeo".to_string(),
                    ..video("elsewhere", "Clip", true)
                },
            ],
        )]),
        credits: HashMap::from([(
            27205,
            TmdbCredits {
                cast: ["Leonardo DiCaprio", "Joseph Gordon-Levitt", "Elliot Page", "Tom Hardy", "Ken Watanabe", "Cillian Murphy"]
                    .iter()
                    .map(|n| TmdbCastMember {
                        name: n.to_string(),
                    })
                    .collect(),
            },
        )]),
        imdb: HashMap::from([(27205, "tt1375666".to_string()), (155, "tt0468569".to_string())]),
        search_results: vec![
            summary(27205, "Inception", Some("2010-07-15")),
            summary(999, "Inception: The Cobol Job", Some("")),
        ],
        discover_results: vec![
            summary(155, "The Dark Knight", Some("2008-07-16")),
            summary(27205, "Inception", Some("2010-07-15")),
        ],
        ..Default::default()
    }
}

fn tools(fake: &Arc<FakeTmdb>) -> MovieTools {
    MovieTools::new(fake.clone())
}

fn parse(out: &str) -> Value {
    serde_json::from_str(out).expect("tool output is JSON")
}

#[tokio::test]
async fn lists_genres_with_string_ids() {
    let fake = Arc::new(catalog());
    let out = tools(&fake).get_genres_list().await.unwrap();
    assert_eq!(
        out,
        r#"[{"GenreId":"28","GenreName":"Action"},{"GenreId":"12","GenreName":"Adventure"}]"#
    );
}

#[tokio::test]
async fn blank_person_name_never_reaches_the_catalog() {
    let fake = Arc::new(catalog());
    let err = tools(&fake).search_for_people("   ").await.unwrap_err();
    assert!(matches!(err, ToolError::Validation(_)));
    assert!(fake.calls().is_empty());

    let out = tools(&fake).search_for_people(" Leonardo ").await.unwrap();
    assert_eq!(parse(&out)[0]["PersonId"], "6193");
    assert_eq!(fake.calls(), vec!["person:Leonardo".to_string()]);
}

#[tokio::test]
async fn search_enriches_each_result_in_order() {
    let fake = Arc::new(catalog());
    let out = tools(&fake).search_movies("Inception", Some("2010")).await.unwrap();
    let v = parse(&out);
    assert_eq!(v.as_array().unwrap().len(), 2);
    assert_eq!(v[0]["MovieId"], "27205");
    assert_eq!(v[0]["ImdbId"], "tt1375666");
    assert_eq!(v[0]["ReleaseDate"], "2010-07-15");
    assert_eq!(v[1]["ReleaseDate"], "");
    assert_eq!(v[1]["ImdbId"], "");
    assert_eq!(
        fake.calls(),
        vec!["search:Inception", "external_ids:27205", "external_ids:999"]
    );
    assert_eq!(fake.searches.lock().unwrap()[0].1, Some(2010));
}

#[tokio::test]
async fn zero_or_garbage_year_searches_unfiltered() {
    let fake = Arc::new(catalog());
    let t = tools(&fake);
    t.search_movies("Inception", Some("0")).await.unwrap();
    t.search_movies("Inception", Some("twenty ten")).await.unwrap();
    t.search_movies("Inception", None).await.unwrap();
    let years: Vec<_> = fake.searches.lock().unwrap().iter().map(|s| s.1).collect();
    assert_eq!(years, vec![None, None, None]);
}

#[tokio::test]
async fn empty_search_is_an_answer_not_an_error() {
    let fake = Arc::new(FakeTmdb::default());
    assert_eq!(tools(&fake).search_movies("zzzz", None).await.unwrap(), "[]");
}

#[tokio::test]
async fn failed_enrichment_fails_the_whole_call() {
    let fake = Arc::new(FakeTmdb {
        fail_external_ids_for: Some(999),
        ..catalog()
    });
    let err = tools(&fake).search_movies("Inception", None).await.unwrap_err();
    assert!(matches!(err, ToolError::Service(_)));
}

#[tokio::test]
async fn trailers_bundle_picks_official_trailer() {
    let fake = Arc::new(catalog());
    let v = parse(&tools(&fake).get_movie_trailers("27205").await.unwrap());
    assert_eq!(v["MovieTitle"], "Inception");
    assert_eq!(v["MovieYear"], 2010);
    assert_eq!(v["TotalVideoCount"], 3);
    assert_eq!(v["MainTrailer"]["Name"], "official");
    assert_eq!(v["Videos"]["Trailers"].as_array().unwrap().len(), 2);
    assert_eq!(v["Videos"]["Teasers"].as_array().unwrap().len(), 1);
    assert!(v["Videos"]["Clips"].as_array().unwrap().is_empty());
    assert_eq!(
        v["MainTrailer"]["EmbedUrl"],
        "https://www.youtube.com/embed/k_official"
    );
}

#[tokio::test]
async fn non_numeric_movie_id_is_rejected_before_calling_out() {
    let fake = Arc::new(catalog());
    let t = tools(&fake);
    for result in [
        t.get_movie_trailers("inception").await,
        t.get_movie_details("tt1375666").await,
        t.describe_movie("").await,
        t.get_movie_with_trailer("12a").await,
    ] {
        assert!(matches!(result, Err(ToolError::Validation(_))));
    }
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn unknown_movie_surfaces_not_found() {
    let fake = Arc::new(catalog());
    let err = tools(&fake).get_movie_details("1").await.unwrap_err();
    assert!(matches!(err, ToolError::NotFound(_)));
}

#[tokio::test]
async fn details_echo_the_requested_id() {
    let fake = Arc::new(catalog());
    let v = parse(&tools(&fake).get_movie_details("27205").await.unwrap());
    assert_eq!(v["MovieId"], "27205");
    assert_eq!(v["ReleaseDate"], "2010-07-15");
    assert_eq!(v["Genres"][0]["Id"], "28");
    assert_eq!(v["Runtime"], 148);
    assert!(v["BackdropPath"].is_null());
}

#[tokio::test]
async fn movie_with_trailer_includes_display_hints() {
    let fake = Arc::new(catalog());
    let v = parse(&tools(&fake).get_movie_with_trailer("27205").await.unwrap());
    assert_eq!(v["DisplayType"], "movie-with-inline-trailer");
    assert_eq!(v["Trailer"]["HasTrailer"], true);
    assert_eq!(v["Trailer"]["Name"], "official");
    assert_eq!(v["Trailer"]["AllowFullScreen"], true);
    assert_eq!(
        v["ChatMessage"],
        "Here's the movie info with trailer - tap to watch full screen!"
    );
}

#[tokio::test]
async fn describe_is_indented_and_survives_missing_credits() {
    let fake = Arc::new(catalog());
    let out = tools(&fake).describe_movie("27205").await.unwrap();
    assert!(out.contains("\n  \"Title\": \"Inception\""));
    let v = parse(&out);
    assert_eq!(v["Cast"].as_array().unwrap().len(), 5);
    assert_eq!(v["Language"], "en");

    let no_credits = Arc::new(FakeTmdb {
        credits: HashMap::new(),
        ..catalog()
    });
    let v = parse(&tools(&no_credits).describe_movie("27205").await.unwrap());
    assert_eq!(v["Cast"], json!([]));
}

#[tokio::test]
async fn generic_trailer_request_is_offline() {
    let fake = Arc::new(catalog());
    let v = parse(&tools(&fake).handle_generic_trailer_request("trailer please").unwrap());
    assert_eq!(v["Type"], "clarification-needed");
    assert_eq!(v["Suggestions"].as_array().unwrap().len(), 3);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn discover_without_filters_preserves_service_order() {
    let fake = Arc::new(catalog());
    let v = parse(&tools(&fake).discover_movies(&DiscoverArgs::default()).await.unwrap());
    assert_eq!(v[0]["MovieName"], "The Dark Knight");
    assert_eq!(v[0]["ImdbId"], "tt0468569");
    assert_eq!(v[1]["MovieName"], "Inception");
    assert!(fake.queries.lock().unwrap()[0].is_empty());
}

#[tokio::test]
async fn discover_validates_before_querying() {
    let fake = Arc::new(catalog());
    let args = DiscoverArgs {
        genre_ids: Some("28,x".to_string()),
        ..Default::default()
    };
    let err = tools(&fake).discover_movies(&args).await.unwrap_err();
    assert!(matches!(err, ToolError::Validation(_)));
    assert!(fake.calls().is_empty());
}

fn registry(fake: &Arc<FakeTmdb>) -> ToolRegistry {
    build_registry(
        tools(fake),
        DateTimeTools::fixed(NaiveDate::from_ymd_opt(2025, 6, 13).unwrap()),
    )
}

#[tokio::test]
async fn registry_exposes_every_tool() {
    let fake = Arc::new(catalog());
    let r = registry(&fake);
    assert_eq!(r.names().len(), 17);
    for name in [
        "today",
        "offset_date",
        "search_movies",
        "get_movie_trailers",
        "describe_movie",
        "discover_movies",
        "handle_generic_trailer_request",
    ] {
        assert!(r.contains(name), "{name} missing");
    }
    let spec = r.specs().into_iter().find(|s| s.name == "search_movies").unwrap();
    assert_eq!(spec.parameters["required"], json!(["movieTitle"]));
}

#[tokio::test]
async fn generic_trailer_request_requires_the_user_query() {
    let fake = Arc::new(catalog());
    let r = registry(&fake);
    let spec = r
        .specs()
        .into_iter()
        .find(|s| s.name == "handle_generic_trailer_request")
        .unwrap();
    assert_eq!(spec.parameters["required"], json!(["userQuery"]));
    assert!(matches!(
        r.call("handle_generic_trailer_request", "{}").await,
        Err(ToolError::Validation(_))
    ));
    let out = r
        .call("handle_generic_trailer_request", r#"{"userQuery":"trailer please"}"#)
        .await
        .unwrap();
    assert_eq!(parse(&out)["Type"], "clarification-needed");
}

#[tokio::test]
async fn discover_rejects_non_finite_vote_strings() {
    let fake = Arc::new(catalog());
    for raw in ["NaN", "inf"] {
        let args = format!(r#"{{"minVoteAverage":"{raw}"}}"#);
        assert!(matches!(
            registry(&fake).call("discover_movies", &args).await,
            Err(ToolError::Validation(_))
        ));
    }
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn registry_routes_arguments_to_tools() {
    let fake = Arc::new(catalog());
    let r = registry(&fake);

    let out = r
        .call("discover_movies", r#"{"genreIds":"28,12","minVoteAverage":"7.5","maxVoteCount":null}"#)
        .await
        .unwrap();
    assert_eq!(parse(&out).as_array().unwrap().len(), 2);
    let query = fake.queries.lock().unwrap()[0].clone();
    assert_eq!(query.get("with_genres"), Some("28,12"));
    assert_eq!(query.get("vote_average.gte"), Some("7.5"));
    assert_eq!(query.get("vote_count.lte"), None);

    let out = r
        .call("search_movies", r#"{"movieTitle":"Inception","releaseYear":2010}"#)
        .await
        .unwrap();
    assert_eq!(parse(&out)[0]["MovieId"], "27205");

    assert_eq!(
        r.call("past_days_range", r#"{"days":10}"#).await.unwrap(),
        "2025-06-03/2025-06-13"
    );
    assert_eq!(
        r.call("offset_date", r#"{"isoDate":"2022-05-20","amount":1,"unit":"y"}"#)
            .await
            .unwrap(),
        "2023-05-20"
    );
    assert!(matches!(
        r.call("offset_date", r#"{"isoDate":"x","amount":1,"unit":"z"}"#).await,
        Err(ToolError::Validation(_))
    ));
    assert!(matches!(
        r.call("get_movie_details", "{}").await,
        Err(ToolError::Validation(_))
    ));
}

#[tokio::test]
async fn repeated_calls_are_byte_identical() {
    let fake = Arc::new(catalog());
    let r = registry(&fake);
    let first = r.call("get_movie_trailers", r#"{"movieId":"27205"}"#).await.unwrap();
    let second = r.call("get_movie_trailers", r#"{"movieId":"27205"}"#).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn keyword_search_routes_through_registry() {
    let fake = Arc::new(catalog());
    let out = registry(&fake)
        .call("search_keywords", r#"{"keyword":"superhero"}"#)
        .await
        .unwrap();
    assert_eq!(out, r#"[{"KeywordId":"9715","Name":"superhero"}]"#);
    assert_eq!(fake.calls(), vec!["keyword:superhero".to_string()]);
}
