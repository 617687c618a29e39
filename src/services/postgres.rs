use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Category, DiscoverFilter, MatchStats, MatchType, Movie, NewMovie, RatingSummary, User,
    UserMatch, UserPreferences, UserRating,
};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for PostgresError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => PostgresError::NotFound("Row not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PostgresError::Conflict(db.message().to_string())
            }
            _ => PostgresError::SqlxError(err),
        }
    }
}

/// Movie columns plus the aggregated genre names; callers append
/// `WHERE ...`, then `GROUP BY m.id` and ordering.
const MOVIE_SELECT: &str = r#"
    SELECT m.id, m.tmdb_id, m.title, m.overview, m.release_date, m.poster_path,
           m.backdrop_path, m.vote_average, m.vote_count, m.popularity, m.original_language,
           COALESCE(
               ARRAY_AGG(c.name ORDER BY c.name) FILTER (WHERE c.id IS NOT NULL),
               ARRAY[]::TEXT[]
           ) AS genres
    FROM movies m
    LEFT JOIN movie_categories mc ON mc.movie_id = m.id
    LEFT JOIN categories c ON c.id = mc.category_id
"#;

const USER_COLUMNS: &str =
    "id, email, password_hash, display_name, avatar_url, google_id, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UpsertedMatch {
    #[sqlx(flatten)]
    user_match: UserMatch,
    inserted: bool,
}

/// PostgreSQL client for users, the movie catalog, matches, ratings and
/// preferences
#[derive(Debug, Clone)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Pool that connects on first use; no migrations are run
    pub fn lazy(database_url: &str) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    // ---- users ----

    /// Insert a password account; fails with `Conflict` when the email is taken
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
    ) -> Result<User, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO users (id, email, password_hash, display_name)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(normalize_email(email))
            .bind(password_hash)
            .bind(display_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match PostgresError::from(e) {
                PostgresError::Conflict(_) => {
                    PostgresError::Conflict(format!("An account for {} already exists", email))
                }
                other => other,
            })?;

        tracing::info!("Created user {}", user.id);
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, PostgresError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, PostgresError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find or create the account behind a Google sign-in
    ///
    /// An existing password account with the same email is linked to the
    /// Google id rather than duplicated.
    pub async fn upsert_google_user(
        &self,
        google_id: &str,
        email: &str,
        display_name: &str,
        avatar_url: Option<&str>,
    ) -> Result<User, PostgresError> {
        let by_google = format!("SELECT {} FROM users WHERE google_id = $1", USER_COLUMNS);
        if let Some(user) = sqlx::query_as::<_, User>(&by_google)
            .bind(google_id)
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(user);
        }

        let query = format!(
            r#"
            INSERT INTO users (id, email, display_name, avatar_url, google_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email)
            DO UPDATE SET
                google_id = EXCLUDED.google_id,
                avatar_url = COALESCE(users.avatar_url, EXCLUDED.avatar_url),
                updated_at = NOW()
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(normalize_email(email))
            .bind(display_name)
            .bind(avatar_url)
            .bind(google_id)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("Linked Google account to user {}", user.id);
        Ok(user)
    }

    // ---- catalog ----

    pub async fn get_movie(&self, movie_id: i32) -> Result<Option<Movie>, PostgresError> {
        let query = format!("{} WHERE m.id = $1 GROUP BY m.id", MOVIE_SELECT);

        let movie = sqlx::query_as::<_, Movie>(&query)
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(movie)
    }

    pub async fn movie_exists(&self, movie_id: i32) -> Result<bool, PostgresError> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM movies WHERE id = $1) AS found")
            .bind(movie_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("found"))
    }

    /// Fetch several movies; order follows `ids`, unknown ids are skipped
    pub async fn get_movies_by_ids(&self, ids: &[i32]) -> Result<Vec<Movie>, PostgresError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("{} WHERE m.id = ANY($1) GROUP BY m.id", MOVIE_SELECT);

        let mut movies = sqlx::query_as::<_, Movie>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        movies.sort_by_key(|m| ids.iter().position(|id| *id == m.id));
        Ok(movies)
    }

    /// Catalog page ordered by popularity, optionally filtered by genre id
    /// and a case-insensitive title search
    pub async fn list_movies(
        &self,
        genre: Option<i32>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Movie>, PostgresError> {
        let query = format!(
            r#"
            {}
            WHERE ($1::INT IS NULL OR EXISTS (
                    SELECT 1 FROM movie_categories g
                    WHERE g.movie_id = m.id AND g.category_id = $1))
              AND ($2::TEXT IS NULL OR m.title ILIKE '%' || $2 || '%')
            GROUP BY m.id
            ORDER BY m.popularity DESC, m.id
            LIMIT $3 OFFSET $4
            "#,
            MOVIE_SELECT
        );

        let movies = sqlx::query_as::<_, Movie>(&query)
            .bind(genre)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(movies)
    }

    pub async fn count_movies(
        &self,
        genre: Option<i32>,
        search: Option<&str>,
    ) -> Result<i64, PostgresError> {
        let query = r#"
            SELECT COUNT(*) AS total
            FROM movies m
            WHERE ($1::INT IS NULL OR EXISTS (
                    SELECT 1 FROM movie_categories g
                    WHERE g.movie_id = m.id AND g.category_id = $1))
              AND ($2::TEXT IS NULL OR m.title ILIKE '%' || $2 || '%')
        "#;

        let row = sqlx::query(query)
            .bind(genre)
            .bind(search)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("total"))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, PostgresError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, tmdb_id FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Insert or refresh a genre, keyed by name
    pub async fn upsert_category(
        &self,
        name: &str,
        tmdb_id: Option<i32>,
    ) -> Result<Category, PostgresError> {
        let query = r#"
            INSERT INTO categories (name, tmdb_id)
            VALUES ($1, $2)
            ON CONFLICT (name)
            DO UPDATE SET tmdb_id = COALESCE(EXCLUDED.tmdb_id, categories.tmdb_id)
            RETURNING id, name, tmdb_id
        "#;

        let category = sqlx::query_as::<_, Category>(query)
            .bind(name)
            .bind(tmdb_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(category)
    }

    /// Insert or refresh a movie keyed by its TMDB id; returns the local id
    pub async fn upsert_movie(&self, movie: &NewMovie) -> Result<i32, PostgresError> {
        let query = r#"
            INSERT INTO movies (tmdb_id, title, overview, release_date, poster_path,
                                backdrop_path, vote_average, vote_count, popularity,
                                original_language)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (tmdb_id)
            DO UPDATE SET
                title = EXCLUDED.title,
                overview = EXCLUDED.overview,
                release_date = EXCLUDED.release_date,
                poster_path = EXCLUDED.poster_path,
                backdrop_path = EXCLUDED.backdrop_path,
                vote_average = EXCLUDED.vote_average,
                vote_count = EXCLUDED.vote_count,
                popularity = EXCLUDED.popularity,
                original_language = EXCLUDED.original_language
            RETURNING id
        "#;

        let row = sqlx::query(query)
            .bind(movie.tmdb_id)
            .bind(&movie.title)
            .bind(&movie.overview)
            .bind(movie.release_date)
            .bind(&movie.poster_path)
            .bind(&movie.backdrop_path)
            .bind(movie.vote_average)
            .bind(movie.vote_count)
            .bind(movie.popularity)
            .bind(&movie.original_language)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("id"))
    }

    /// Replace the genre links of a movie
    pub async fn set_movie_categories(
        &self,
        movie_id: i32,
        category_ids: &[i32],
    ) -> Result<(), PostgresError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM movie_categories WHERE movie_id = $1")
            .bind(movie_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO movie_categories (movie_id, category_id)
            SELECT $1, UNNEST($2::INT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(movie_id)
        .bind(category_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Unmatched movies for the discover pool, most popular first
    ///
    /// `skip_ids` lets a second pass avoid movies an earlier pass already
    /// returned.
    pub async fn discover_candidates(
        &self,
        user_id: Uuid,
        filter: &DiscoverFilter,
        skip_ids: &[i32],
        limit: usize,
    ) -> Result<Vec<Movie>, PostgresError> {
        let query = format!(
            r#"
            {}
            WHERE NOT EXISTS (
                    SELECT 1 FROM user_matches um
                    WHERE um.user_id = $1 AND um.movie_id = m.id)
              AND NOT (m.id = ANY($2::INT[]))
              AND (CARDINALITY($3::INT[]) = 0 OR EXISTS (
                    SELECT 1 FROM movie_categories g
                    WHERE g.movie_id = m.id AND g.category_id = ANY($3::INT[])))
              AND ($4::INT IS NULL OR m.release_date >= MAKE_DATE($4, 1, 1))
              AND ($5::INT IS NULL OR m.release_date < MAKE_DATE($5 + 1, 1, 1))
            GROUP BY m.id
            ORDER BY m.popularity DESC, m.id
            LIMIT $6
            "#,
            MOVIE_SELECT
        );

        let movies = sqlx::query_as::<_, Movie>(&query)
            .bind(user_id)
            .bind(skip_ids)
            .bind(&filter.genres)
            .bind(filter.min_release_year)
            .bind(filter.max_release_year)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            "Fetched {} discover candidates for {} (genres: {:?})",
            movies.len(),
            user_id,
            filter.genres
        );

        Ok(movies)
    }

    /// Candidate pool for one discover page
    ///
    /// Fetches up to `pool_size` unmatched movies for the filter. When a genre
    /// filter comes up short, the rest is filled from the same query without
    /// genres, skipping movies already in the pool. Genre matches come first.
    pub async fn discover_pool(
        &self,
        user_id: Uuid,
        filter: &DiscoverFilter,
        pool_size: usize,
    ) -> Result<Vec<Movie>, PostgresError> {
        let mut pool = self.discover_candidates(user_id, filter, &[], pool_size).await?;

        if filter.has_genres() && pool.len() < pool_size {
            let fetched: Vec<i32> = pool.iter().map(|m| m.id).collect();
            let top_up = self
                .discover_candidates(user_id, &filter.without_genres(), &fetched, pool_size - pool.len())
                .await?;

            tracing::debug!(
                "Genre pool for {} had {} movies, topped up with {}",
                user_id,
                fetched.len(),
                top_up.len()
            );
            pool.extend(top_up);
        }

        Ok(pool)
    }

    // ---- matches ----

    /// Record a decision; an existing (user, movie) pair has its type replaced
    ///
    /// Returns the stored match and whether it was newly inserted.
    pub async fn upsert_match(
        &self,
        user_id: Uuid,
        movie_id: i32,
        match_type: MatchType,
    ) -> Result<(UserMatch, bool), PostgresError> {
        let query = r#"
            INSERT INTO user_matches (id, user_id, movie_id, match_type)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, movie_id)
            DO UPDATE SET
                match_type = EXCLUDED.match_type,
                updated_at = NOW()
            RETURNING id, user_id, movie_id, match_type, created_at, updated_at,
                      (xmax = 0) AS inserted
        "#;

        let row = sqlx::query_as::<_, UpsertedMatch>(query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(movie_id)
            .bind(match_type)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded match: {} -> {} ({}, inserted: {})",
            user_id,
            movie_id,
            match_type,
            row.inserted
        );

        Ok((row.user_match, row.inserted))
    }

    pub async fn get_match(
        &self,
        user_id: Uuid,
        movie_id: i32,
    ) -> Result<Option<UserMatch>, PostgresError> {
        let query = r#"
            SELECT id, user_id, movie_id, match_type, created_at, updated_at
            FROM user_matches
            WHERE user_id = $1 AND movie_id = $2
        "#;

        let found = sqlx::query_as::<_, UserMatch>(query)
            .bind(user_id)
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found)
    }

    /// Matches newest first, optionally of a single type
    pub async fn list_matches(
        &self,
        user_id: Uuid,
        match_type: Option<MatchType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserMatch>, PostgresError> {
        let query = r#"
            SELECT id, user_id, movie_id, match_type, created_at, updated_at
            FROM user_matches
            WHERE user_id = $1 AND ($2::match_type IS NULL OR match_type = $2)
            ORDER BY updated_at DESC, id
            LIMIT $3 OFFSET $4
        "#;

        let matches = sqlx::query_as::<_, UserMatch>(query)
            .bind(user_id)
            .bind(match_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(matches)
    }

    pub async fn update_match_type(
        &self,
        user_id: Uuid,
        movie_id: i32,
        match_type: MatchType,
    ) -> Result<UserMatch, PostgresError> {
        let query = r#"
            UPDATE user_matches
            SET match_type = $3, updated_at = NOW()
            WHERE user_id = $1 AND movie_id = $2
            RETURNING id, user_id, movie_id, match_type, created_at, updated_at
        "#;

        sqlx::query_as::<_, UserMatch>(query)
            .bind(user_id)
            .bind(movie_id)
            .bind(match_type)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("No match for movie {}", movie_id)))
    }

    /// Remove a match; returns false when there was none
    pub async fn delete_match(&self, user_id: Uuid, movie_id: i32) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM user_matches WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn match_stats(&self, user_id: Uuid) -> Result<MatchStats, PostgresError> {
        let query = r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE match_type = 'like') AS likes,
                COUNT(*) FILTER (WHERE match_type = 'dislike') AS dislikes,
                COUNT(*) FILTER (WHERE match_type = 'superlike') AS superlikes,
                MAX(updated_at) AS last_matched_at
            FROM user_matches
            WHERE user_id = $1
        "#;

        let row = sqlx::query(query).bind(user_id).fetch_one(&self.pool).await?;

        Ok(MatchStats {
            total: row.get("total"),
            like: row.get("likes"),
            dislike: row.get("dislikes"),
            superlike: row.get("superlikes"),
            last_matched_at: row.get("last_matched_at"),
        })
    }

    // ---- ratings ----

    pub async fn upsert_rating(
        &self,
        user_id: Uuid,
        movie_id: i32,
        score: i16,
        review: Option<&str>,
    ) -> Result<UserRating, PostgresError> {
        let query = r#"
            INSERT INTO user_ratings (id, user_id, movie_id, score, review)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, movie_id)
            DO UPDATE SET
                score = EXCLUDED.score,
                review = EXCLUDED.review,
                updated_at = NOW()
            RETURNING id, user_id, movie_id, score, review, created_at, updated_at
        "#;

        let rating = sqlx::query_as::<_, UserRating>(query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(movie_id)
            .bind(score)
            .bind(review)
            .fetch_one(&self.pool)
            .await?;

        Ok(rating)
    }

    pub async fn get_rating(
        &self,
        user_id: Uuid,
        movie_id: i32,
    ) -> Result<Option<UserRating>, PostgresError> {
        let query = r#"
            SELECT id, user_id, movie_id, score, review, created_at, updated_at
            FROM user_ratings
            WHERE user_id = $1 AND movie_id = $2
        "#;

        let rating = sqlx::query_as::<_, UserRating>(query)
            .bind(user_id)
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(rating)
    }

    pub async fn list_ratings(&self, user_id: Uuid) -> Result<Vec<UserRating>, PostgresError> {
        let query = r#"
            SELECT id, user_id, movie_id, score, review, created_at, updated_at
            FROM user_ratings
            WHERE user_id = $1
            ORDER BY updated_at DESC
        "#;

        let ratings = sqlx::query_as::<_, UserRating>(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ratings)
    }

    pub async fn delete_rating(&self, user_id: Uuid, movie_id: i32) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM user_ratings WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn movie_rating_summary(&self, movie_id: i32) -> Result<RatingSummary, PostgresError> {
        let query = r#"
            SELECT AVG(score)::FLOAT8 AS average_score, COUNT(*) AS rating_count
            FROM user_ratings
            WHERE movie_id = $1
        "#;

        let row = sqlx::query(query).bind(movie_id).fetch_one(&self.pool).await?;

        Ok(RatingSummary {
            average_score: row.get("average_score"),
            rating_count: row.get("rating_count"),
        })
    }

    // ---- preferences ----

    pub async fn get_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserPreferences>, PostgresError> {
        let query = r#"
            SELECT user_id, favorite_genres, min_release_year, max_release_year, updated_at
            FROM user_preferences
            WHERE user_id = $1
        "#;

        let prefs = sqlx::query_as::<_, UserPreferences>(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(prefs)
    }

    pub async fn upsert_preferences(
        &self,
        user_id: Uuid,
        favorite_genres: &[i32],
        min_release_year: Option<i32>,
        max_release_year: Option<i32>,
    ) -> Result<UserPreferences, PostgresError> {
        let query = r#"
            INSERT INTO user_preferences (user_id, favorite_genres, min_release_year, max_release_year)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id)
            DO UPDATE SET
                favorite_genres = EXCLUDED.favorite_genres,
                min_release_year = EXCLUDED.min_release_year,
                max_release_year = EXCLUDED.max_release_year,
                updated_at = NOW()
            RETURNING user_id, favorite_genres, min_release_year, max_release_year, updated_at
        "#;

        let prefs = sqlx::query_as::<_, UserPreferences>(query)
            .bind(user_id)
            .bind(favorite_genres)
            .bind(min_release_year)
            .bind(max_release_year)
            .fetch_one(&self.pool)
            .await?;

        Ok(prefs)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
