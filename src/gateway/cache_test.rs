use super::*;

#[test]
fn cached_rows_are_returned_by_key() {
    let cache = QueryCache::new(true);
    let generation = cache.generation();
    assert!(cache.put_if_current(QueryKey::Members(1), generation, vec![10, 20]));

    assert_eq!(cache.get::<i32>(&QueryKey::Members(1)), Some(vec![10, 20]));
    assert_eq!(cache.get::<i32>(&QueryKey::Members(2)), None);
}

#[test]
fn wrong_type_is_a_miss() {
    let cache = QueryCache::new(true);
    cache.put_if_current(QueryKey::Projects, cache.generation(), vec!["a".to_owned()]);
    assert_eq!(cache.get::<i32>(&QueryKey::Projects), None);
}

#[test]
fn read_that_raced_an_invalidation_is_not_cached() {
    let cache = QueryCache::new(true);
    let before = cache.generation();
    cache.invalidate(&[QueryKey::Projects]);

    assert!(!cache.put_if_current(QueryKey::Projects, before, vec![1]));
    assert!(cache.is_empty());
}

#[test]
fn invalidate_removes_only_named_scopes() {
    let cache = QueryCache::new(true);
    let folder_scope = QueryKey::Files { project_id: 1, folder_id: Some(3) };
    let project_scope = QueryKey::Files { project_id: 1, folder_id: None };
    let other = QueryKey::Milestones(1);
    for key in [folder_scope, project_scope, other] {
        cache.put_if_current(key, cache.generation(), vec![1]);
    }

    cache.invalidate(&[folder_scope, project_scope]);

    assert_eq!(cache.len(), 1);
    assert!(cache.get::<i32>(&other).is_some());
}

#[test]
fn invalidate_where_matches_every_variant_of_a_scope() {
    let cache = QueryCache::new(true);
    for folder_id in [None, Some(1), Some(2)] {
        cache.put_if_current(QueryKey::Files { project_id: 7, folder_id }, cache.generation(), vec![1]);
    }
    cache.put_if_current(QueryKey::Files { project_id: 8, folder_id: None }, cache.generation(), vec![1]);

    cache.invalidate_where(|key| matches!(key, QueryKey::Files { project_id: 7, .. }));

    assert_eq!(cache.len(), 1);
}

#[test]
fn disabled_cache_stores_nothing() {
    let cache = QueryCache::new(false);
    assert!(!cache.put_if_current(QueryKey::Users, cache.generation(), vec![1]));
    assert_eq!(cache.get::<i32>(&QueryKey::Users), None);
}

#[test]
fn clones_share_entries() {
    let cache = QueryCache::new(true);
    let other = cache.clone();
    cache.put_if_current(QueryKey::Users, cache.generation(), vec![1]);
    assert_eq!(other.get::<i32>(&QueryKey::Users), Some(vec![1]));
    other.clear();
    assert!(cache.is_empty());
}
