/// 为只以 TEXT 列存储的枚举实现 sqlx 编解码
///
/// 类型需提供 `as_str()` 并实现 `FromStr<Err = String>`。
macro_rules! text_column {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, sqlx::error::BoxDynError> {
                let text = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(text.parse::<$ty>()?)
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> ::core::result::Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<'_, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

pub(crate) use text_column;

pub mod codec;
mod listing;
mod media;
mod patch;
mod post;
mod publication;
mod review;
pub mod slug;
mod taxonomy;
pub mod validate;

pub use self::{
    codec::{DayHours, ListingImage, LocationData, OpeningHours, Weekday},
    listing::{DirectoryListing, ListingPatch, ListingRow, NewListing, PriceRange},
    media::{FileType, MediaItem, MediaPatch, NewMedia},
    patch::Patch,
    post::{BlogPost, NewPost, PostPatch, TagRef},
    publication::{PostStatus, Publication, PublishIntent},
    review::{
        DirectoryReview, NewReport, NewResponse, NewReview, Rating, RatingSummary, ReviewReport,
        ReviewResponse,
    },
    slug::generate_slug,
    taxonomy::{Category, NewTerm, Tag, TermPatch},
};
