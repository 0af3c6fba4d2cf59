mod common;

use chrono::{Duration, Utc};
use serde_json::json;
use travelbook::{
    content::{MediaPatch, NewListing, NewMedia, NewPost, NewResponse, NewReview, PostPatch, PostStatus},
    error::Error,
    storage::{
        CategoryKind, LinkStore, ListingFilter, ListingStore, MediaStore, PostFilter, PostStore,
        ReviewStore, TaxonomyStore,
    },
};

use common::{create_category, create_user, nonce, setup};

fn new_post(value: serde_json::Value) -> NewPost {
    serde_json::from_value(value).expect("构造文章失败")
}

fn new_listing(value: serde_json::Value) -> NewListing {
    serde_json::from_value(value).expect("构造商户失败")
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_scheduled_post_lifecycle() {
    let pool = setup().await;
    let tag = nonce();
    let author = create_user(&pool, &tag).await;

    let future = Utc::now() + Duration::hours(1);
    let post = pool
        .create_post(new_post(json!({
            "title": format!("Sunrise at Batur {tag}"),
            "author_id": author,
            "status": "scheduled",
            "publish_date": future,
        })))
        .await
        .unwrap();

    assert_eq!(post.status, PostStatus::Scheduled);
    assert!(!post.published);
    assert_eq!(
        post.published_at.map(|t| t.timestamp_millis()),
        Some(future.timestamp_millis())
    );

    // 还未到期，不会被发布
    let ids = pool.publish_due_posts(Utc::now()).await.unwrap();
    assert!(!ids.contains(&post.id));

    let ids = pool
        .publish_due_posts(future + Duration::minutes(1))
        .await
        .unwrap();
    assert!(ids.contains(&post.id));

    let post = pool.post_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(post.status, PostStatus::Published);
    assert!(post.published);
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_scheduled_in_past_publishes_immediately() {
    let pool = setup().await;
    let tag = nonce();
    let author = create_user(&pool, &tag).await;

    let post = pool
        .create_post(new_post(json!({
            "title": format!("Old news {tag}"),
            "author_id": author,
            "status": "scheduled",
            "publish_date": Utc::now() - Duration::hours(1),
        })))
        .await
        .unwrap();

    assert_eq!(post.status, PostStatus::Published);
    assert!(post.published);
    assert!(post.published_at.unwrap() > Utc::now() - Duration::minutes(5));
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_update_post_partial_and_version() {
    let pool = setup().await;
    let tag = nonce();
    let author = create_user(&pool, &tag).await;

    let post = pool
        .create_post(new_post(json!({
            "title": format!("Draft {tag}"),
            "author_id": author,
            "excerpt": "short",
        })))
        .await
        .unwrap();
    assert_eq!(post.status, PostStatus::Draft);
    assert_eq!(post.published_at, None);

    // 只修改正文，其余字段不变
    let patch: PostPatch = serde_json::from_value(json!({ "content": "Body" })).unwrap();
    let updated = pool.update_post(post.id, patch).await.unwrap().unwrap();
    assert_eq!(updated.content, "Body");
    assert_eq!(updated.excerpt.as_deref(), Some("short"));
    assert_eq!(updated.title, post.title);
    assert_eq!(updated.version, post.version + 1);

    // 旧版本号被拒绝
    let stale: PostPatch = serde_json::from_value(json!({
        "excerpt": null,
        "expected_version": post.version,
    }))
    .unwrap();
    let err = pool.update_post(post.id, stale).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // 不存在的文章
    let missing = pool.update_post(i64::MAX, PostPatch::default()).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_delete_category_nulls_posts() {
    let pool = setup().await;
    let tag = nonce();
    let author = create_user(&pool, &tag).await;
    let category = create_category(&pool, CategoryKind::Blog, &format!("Islands {tag}")).await;

    let post = pool
        .create_post(new_post(json!({
            "title": format!("Gili hopping {tag}"),
            "author_id": author,
            "category_id": category.id,
        })))
        .await
        .unwrap();
    assert_eq!(post.category_name.as_deref(), Some(category.name.as_str()));

    assert!(pool.delete_category(CategoryKind::Blog, category.id).await.unwrap());

    let post = pool.post_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(post.category_id, None);
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_directory_category_with_listings_is_restricted() {
    let pool = setup().await;
    let tag = nonce();
    let category = create_category(&pool, CategoryKind::Directory, &format!("Cafes {tag}")).await;

    pool.create_listing(new_listing(json!({
        "name": format!("Kopi {tag}"),
        "category_id": category.id,
    })))
    .await
    .unwrap();

    let err = pool
        .delete_category(CategoryKind::Directory, category.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_delete_post_removes_associations() {
    let pool = setup().await;
    let tag = nonce();
    let author = create_user(&pool, &tag).await;
    let directory = create_category(&pool, CategoryKind::Directory, &format!("Dive shops {tag}")).await;

    let t1 = pool
        .create_tag(travelbook::content::NewTerm::named(format!("diving {tag}")))
        .await
        .unwrap();
    let t2 = pool
        .create_tag(travelbook::content::NewTerm::named(format!("bali {tag}")))
        .await
        .unwrap();

    let post = pool
        .create_post(new_post(json!({
            "title": format!("Reef guide {tag}"),
            "author_id": author,
            "tag_ids": [t1.id, t2.id],
        })))
        .await
        .unwrap();
    assert_eq!(post.tags.len(), 2);

    let listing = pool
        .create_listing(new_listing(json!({
            "name": format!("Blue Corner {tag}"),
            "category_id": directory.id,
        })))
        .await
        .unwrap();
    pool.link_post_listing(post.id, listing.id).await.unwrap();
    // 重复关联不报错
    pool.link_post_listing(post.id, listing.id).await.unwrap();
    assert_eq!(pool.listings_for_post(post.id).await.unwrap().len(), 1);

    assert!(pool.delete_post(post.id).await.unwrap());

    let tags: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blog_post_tags WHERE post_id = $1")
        .bind(post.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blog_post_listings WHERE post_id = $1")
        .bind(post.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((tags, links), (0, 0));

    // 标签本身保留
    assert!(pool.tag_by_id(t1.id).await.unwrap().is_some());
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_unknown_tag_rolls_back_post() {
    let pool = setup().await;
    let tag = nonce();
    let author = create_user(&pool, &tag).await;
    let title = format!("Rollback {tag}");

    let err = pool
        .create_post(new_post(json!({
            "title": title,
            "author_id": author,
            "tag_ids": [i64::MAX],
        })))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blog_posts WHERE title = $1")
        .bind(&title)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_search_paginates_with_total() {
    let pool = setup().await;
    let tag = nonce();
    let author = create_user(&pool, &tag).await;

    let titles = ["Reef walk", "Desert hike", "Night reef dive", "Old town food tour", "Reef safety"];
    for title in titles {
        pool.create_post(new_post(json!({
            "title": format!("{title} {tag}"),
            "content": "Notes from the trip.",
            "author_id": author,
            "status": "published",
        })))
        .await
        .unwrap();
    }

    // 作者唯一，限定在本测试的 5 篇文章内
    let filter = PostFilter {
        search: Some("reef".into()),
        author_id: Some(author),
        limit: Some(2),
        page: Some(1),
        ..Default::default()
    };
    let page = pool.list_posts(&filter).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert!(page.items.iter().all(|post| post.title.to_lowercase().contains("reef")));

    let second = pool
        .list_posts(&PostFilter { page: Some(2), ..filter.clone() })
        .await
        .unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.total, 3);

    let empty = PostFilter {
        search: Some(format!("{tag}-nothing")),
        ..Default::default()
    };
    let page = pool.list_posts(&empty).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_duplicate_name_gets_suffixed_slug() {
    let pool = setup().await;
    let tag = nonce();
    let name = format!("Beach Guides {tag}");

    let first = create_category(&pool, CategoryKind::Blog, &name).await;
    let second = create_category(&pool, CategoryKind::Blog, &name).await;

    assert_eq!(first.slug, format!("beach-guides-{tag}"));
    assert_ne!(first.slug, second.slug);
    let suffix = second
        .slug
        .strip_prefix(&format!("{}-", first.slug))
        .expect("应带有后缀");
    assert!(suffix.len() >= 4 && suffix.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_bulk_feature_keeps_partial_success() {
    let pool = setup().await;
    let tag = nonce();
    let category = create_category(&pool, CategoryKind::Directory, &format!("Stays {tag}")).await;

    let mut ids = Vec::new();
    for name in ["Villa Uma", "Surf Camp"] {
        let listing = pool
            .create_listing(new_listing(json!({
                "name": format!("{name} {tag}"),
                "category_id": category.id,
            })))
            .await
            .unwrap();
        ids.push(listing.id);
    }
    let missing = i64::MAX;
    ids.push(missing);

    let outcome = pool.bulk_set_featured(&ids, true).await;
    assert!(!outcome.complete);
    assert_eq!(outcome.succeeded.len(), 2);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].id, missing);

    let filter = ListingFilter {
        search: Some(tag.clone()),
        featured: Some(true),
        ..Default::default()
    };
    assert_eq!(pool.list_listings(&filter).await.unwrap().total, 2);
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_listing_structured_fields() {
    let pool = setup().await;
    let tag = nonce();
    let category = create_category(&pool, CategoryKind::Directory, &format!("Food {tag}")).await;

    let listing = pool
        .create_listing(new_listing(json!({
            "name": format!("Warung {tag}"),
            "category_id": category.id,
            "location_data": { "lat": -8.65, "lng": 115.13, "address": "Canggu" },
            "hours": { "monday": { "open": "08:00", "close": "21:00" }, "tuesday": "Closed" },
            "images": [ { "url": "/media/warung.jpg", "name": "front" } ],
            "price_range": "$"
        })))
        .await
        .unwrap();

    assert_eq!(listing.location, "Canggu");
    assert_eq!(listing.coordinates.as_deref(), Some("-8.65,115.13"));
    assert_eq!(listing.hours.len(), 2);
    assert_eq!(listing.images.len(), 1);
    assert_eq!(listing.category_name.as_deref(), Some(category.name.as_str()));

    // 损坏的数据读取时降级为空值
    sqlx::query("UPDATE directory_listings SET hours = 'not json' WHERE id = $1")
        .bind(listing.id)
        .execute(&pool)
        .await
        .unwrap();
    let listing = pool.listing_by_slug(&listing.slug).await.unwrap().unwrap();
    assert!(listing.hours.is_empty());
    assert_eq!(listing.images.len(), 1);
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_reviews_ratings_and_responses() {
    let pool = setup().await;
    let tag = nonce();
    let category = create_category(&pool, CategoryKind::Directory, &format!("Tours {tag}")).await;
    let listing = pool
        .create_listing(new_listing(json!({
            "name": format!("Volcano Tours {tag}"),
            "category_id": category.id,
        })))
        .await
        .unwrap();

    let review = |rating: i64| NewReview {
        rating,
        content: "Worth the early start".into(),
        user_id: None,
        user_name: "Kai".into(),
    };

    for rating in [0, 6] {
        let err = pool.create_review(listing.id, review(rating)).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
    assert!(pool.create_review(i64::MAX, review(4)).await.unwrap().is_none());

    let first = pool.create_review(listing.id, review(4)).await.unwrap().unwrap();
    pool.create_review(listing.id, review(5)).await.unwrap().unwrap();

    let summary = pool.rating_summary(listing.id).await.unwrap();
    assert_eq!(summary.review_count, 2);
    assert_eq!(summary.average_rating, Some(4.5));

    let reviews = pool.reviews_for_listing(listing.id).await.unwrap().unwrap();
    assert_eq!(reviews.len(), 2);
    assert!(reviews[0].created_at >= reviews[1].created_at);

    // 计数不会小于 0
    assert_eq!(pool.toggle_helpful(first.id, false).await.unwrap(), Some(0));
    assert_eq!(pool.toggle_helpful(first.id, true).await.unwrap(), Some(1));

    // 再次回复会覆盖
    for content in ["Thanks!", "Thanks, see you again"] {
        pool.respond(
            first.id,
            NewResponse {
                content: content.into(),
                respondent_name: "Owner".into(),
            },
        )
        .await
        .unwrap()
        .unwrap();
    }
    let review = pool.review_by_id(first.id).await.unwrap().unwrap();
    let response = review.response.expect("应有回复").0;
    assert_eq!(response.content, "Thanks, see you again");

    // 删除商户级联删除评论
    assert!(pool.delete_listing(listing.id).await.unwrap());
    assert!(pool.review_by_id(first.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_delete_media_removes_file() {
    let pool = setup().await;
    let root = tempfile::tempdir().unwrap();
    let tag = nonce();

    let relative = format!("{tag}.jpg");
    std::fs::write(root.path().join(&relative), b"jpeg").unwrap();

    let media = pool
        .create_media(NewMedia {
            filename: relative.clone(),
            original_filename: "IMG_0001.JPG".into(),
            file_path: relative.clone(),
            file_size: 4,
            file_type: None,
            mime_type: "image/jpeg".into(),
            width: Some(640),
            height: Some(480),
            alt_text: None,
            caption: None,
        })
        .await
        .unwrap();
    assert_eq!(media.file_type.as_str(), "image");

    assert!(pool.delete_media(media.id, root.path()).await.unwrap());
    assert!(!root.path().join(&relative).exists());
    assert!(!pool.delete_media(media.id, root.path()).await.unwrap());
}

#[tokio::test]
#[ignore = "存储测试 依赖真实数据库"]
async fn test_delete_media_with_missing_file_still_succeeds() {
    let pool = setup().await;
    let root = tempfile::tempdir().unwrap();
    let tag = nonce();

    let relative = format!("gone/{tag}.pdf");
    let media = pool
        .create_media(NewMedia {
            filename: format!("{tag}.pdf"),
            original_filename: "menu.pdf".into(),
            file_path: relative.clone(),
            file_size: 1024,
            file_type: None,
            mime_type: "application/pdf".into(),
            width: None,
            height: None,
            alt_text: None,
            caption: None,
        })
        .await
        .unwrap();
    assert!(!root.path().join(&relative).exists());

    // 空修改不写库，原样返回
    let unchanged = pool.update_media(media.id, MediaPatch::default()).await.unwrap().unwrap();
    assert_eq!(unchanged.updated_at, media.updated_at);
    assert!(pool.update_media(i64::MAX, MediaPatch::default()).await.unwrap().is_none());

    // 文件删除失败只记录日志
    assert!(pool.delete_media(media.id, root.path()).await.unwrap());
    assert!(pool.media_by_id(media.id).await.unwrap().is_none());
}
