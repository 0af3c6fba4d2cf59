mod associations;
mod bulk;
mod filter;
mod listings;
mod media;
mod postgres;
mod posts;
mod reviews;
mod slugs;
mod taxonomy;

pub use self::{
    associations::{LinkStore, replace_post_tags, tags_for_posts},
    bulk::{BulkFailure, BulkOutcome},
    filter::{
        ListingFilter, ListingSort, MediaFilter, Page, Pagination, PostFilter, PostSort, SortDirection,
        like_pattern,
    },
    listings::ListingStore,
    media::MediaStore,
    postgres::{DBPool, finish, migrate, new_db_pool},
    posts::PostStore,
    reviews::ReviewStore,
    slugs::{SlugScope, base_slug, slug_taken, unique_slug},
    taxonomy::{CategoryKind, TaxonomyStore},
};
