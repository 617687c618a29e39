// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Category, DiscoverFilter, MatchStats, MatchType, Movie, NewMovie, RatingSummary, User,
    UserMatch, UserPreferences, UserRating,
};
pub use requests::{
    CreateMatchRequest, DiscoverQuery, ListMatchesQuery, ListMoviesQuery, LoginRequest,
    OAuthCallbackQuery, RateMovieRequest, RegisterRequest, SyncMoviesQuery, UpdateMatchRequest,
    UpdatePreferencesRequest,
};
pub use responses::{
    AuthResponse, DiscoverResponse, ErrorResponse, HealthResponse, MatchListResponse,
    MatchResponse, MatchWithMovie, MovieDetailResponse, MovieListResponse,
    SyncResponse,
};
