use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use crate::content::{FileType, PostStatus, PriceRange};

const MAX_LIMIT: i64 = 100;

/// 分页结果
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let Pagination { page, limit } = pagination;
        Self {
            items,
            total,
            page,
            limit,
            total_pages: (total + limit - 1) / limit,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

/// 偏移分页参数，`page` 从 1 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT),
        }
    }

    /// 超大页码饱和到 `i64::MAX`，查询结果为空而不是溢出
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// 追加 `LIMIT` 与 `OFFSET`
    pub fn push_to(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" LIMIT ").push_bind(self.limit);
        builder.push(" OFFSET ").push_bind(self.offset());
    }
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// 只有不区分大小写的 `desc` 得到 [`SortDirection::Desc`]，其余输入一律为升序。
    /// 未提供时使用 `default`。
    pub fn parse(input: Option<&str>, default: SortDirection) -> Self {
        match input {
            None => default,
            Some(s) if s.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            Some(_) => SortDirection::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// 可排序字段白名单
///
/// 只有 [`SortField::column`] 返回的静态列名会拼入 SQL。
pub trait SortField: Copy {
    fn column(&self) -> &'static str;
}

/// 追加 `ORDER BY`，以 id 作为次序保证分页稳定
pub fn push_order(
    builder: &mut QueryBuilder<'_, Postgres>,
    alias: &'static str,
    field: impl SortField,
    direction: SortDirection,
) {
    let dir = direction.as_sql();
    builder.push(format_args!(
        " ORDER BY {alias}.{} {dir} NULLS LAST, {alias}.id {dir}",
        field.column()
    ));
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostSort {
    Title,
    #[default]
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    ViewsCount,
}

impl PostSort {
    pub fn parse(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            Some("title") => PostSort::Title,
            Some("created_at") => PostSort::CreatedAt,
            Some("updated_at") => PostSort::UpdatedAt,
            Some("published_at") => PostSort::PublishedAt,
            Some("views_count") => PostSort::ViewsCount,
            _ => PostSort::default(),
        }
    }
}

impl SortField for PostSort {
    fn column(&self) -> &'static str {
        match self {
            PostSort::Title => "title",
            PostSort::CreatedAt => "created_at",
            PostSort::UpdatedAt => "updated_at",
            PostSort::PublishedAt => "published_at",
            PostSort::ViewsCount => "views_count",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingSort {
    #[default]
    Name,
    CreatedAt,
    UpdatedAt,
    Location,
    PriceRange,
}

impl ListingSort {
    pub fn parse(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            Some("name") => ListingSort::Name,
            Some("created_at") => ListingSort::CreatedAt,
            Some("updated_at") => ListingSort::UpdatedAt,
            Some("location") => ListingSort::Location,
            Some("price_range") => ListingSort::PriceRange,
            _ => ListingSort::default(),
        }
    }
}

impl SortField for ListingSort {
    fn column(&self) -> &'static str {
        match self {
            ListingSort::Name => "name",
            ListingSort::CreatedAt => "created_at",
            ListingSort::UpdatedAt => "updated_at",
            ListingSort::Location => "location",
            ListingSort::PriceRange => "price_range",
        }
    }
}

/// 构造 `ILIKE` 子串匹配模式，转义 `\`、`%` 和 `_`
pub fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// 文章列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostFilter {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub tag_id: Option<i64>,
    pub published: Option<bool>,
    pub status: Option<PostStatus>,
    pub author_id: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl PostFilter {
    pub const DEFAULT_LIMIT: i64 = 10;

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit, Self::DEFAULT_LIMIT)
    }

    pub fn sort(&self) -> (PostSort, SortDirection) {
        (
            PostSort::parse(self.sort.as_deref()),
            SortDirection::parse(self.order.as_deref(), SortDirection::Desc),
        )
    }

    /// 追加 `WHERE` 条件，文章表别名为 `p`
    ///
    /// 列表查询与计数查询共用此函数，保证两者条件一致。
    pub fn push_predicate(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" WHERE TRUE");

        if let Some(search) = non_blank(&self.search) {
            let pattern = like_pattern(search);
            builder
                .push(" AND (p.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.content ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category_id) = self.category_id {
            builder.push(" AND p.category_id = ").push_bind(category_id);
        }
        if let Some(tag_id) = self.tag_id {
            builder
                .push(" AND EXISTS (SELECT 1 FROM blog_post_tags pt WHERE pt.post_id = p.id AND pt.tag_id = ")
                .push_bind(tag_id)
                .push(")");
        }
        if let Some(published) = self.published {
            builder.push(" AND p.published = ").push_bind(published);
        }
        if let Some(status) = self.status {
            builder.push(" AND p.status = ").push_bind(status);
        }
        if let Some(author_id) = self.author_id {
            builder.push(" AND p.author_id = ").push_bind(author_id);
        }
    }
}

/// 商户列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListingFilter {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub location: Option<String>,
    pub featured: Option<bool>,
    pub price_range: Option<PriceRange>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListingFilter {
    pub const DEFAULT_LIMIT: i64 = 20;

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit, Self::DEFAULT_LIMIT)
    }

    pub fn sort(&self) -> (ListingSort, SortDirection) {
        (
            ListingSort::parse(self.sort.as_deref()),
            SortDirection::parse(self.order.as_deref(), SortDirection::Asc),
        )
    }

    /// 追加 `WHERE` 条件，商户表别名为 `l`
    pub fn push_predicate(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" WHERE TRUE");

        if let Some(search) = non_blank(&self.search) {
            let pattern = like_pattern(search);
            builder
                .push(" AND (l.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR l.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category_id) = self.category_id {
            builder.push(" AND l.category_id = ").push_bind(category_id);
        }
        if let Some(location) = non_blank(&self.location) {
            builder
                .push(" AND l.location ILIKE ")
                .push_bind(like_pattern(location));
        }
        if let Some(featured) = self.featured {
            builder.push(" AND l.featured = ").push_bind(featured);
        }
        if let Some(price_range) = self.price_range {
            builder.push(" AND l.price_range = ").push_bind(price_range);
        }
    }
}

/// 媒体库查询参数，按上传时间倒序
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaFilter {
    pub file_type: Option<FileType>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl MediaFilter {
    pub const DEFAULT_LIMIT: i64 = 20;

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit, Self::DEFAULT_LIMIT)
    }

    /// 追加 `WHERE` 条件，媒体表别名为 `m`
    pub fn push_predicate(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" WHERE TRUE");

        if let Some(file_type) = self.file_type {
            builder.push(" AND m.file_type = ").push_bind(file_type);
        }
        if let Some(search) = non_blank(&self.search) {
            let pattern = like_pattern(search);
            builder
                .push(" AND (m.original_filename ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR m.alt_text ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }
}
