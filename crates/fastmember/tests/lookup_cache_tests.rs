use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use fastmember::{
    AccessError, AccessResult, AccessorCache, BindingScope, CacheOptions, FieldDef, LookupCache,
    MemberDescriptor, MemberKind, MemberSource, MethodDef, PropertyDef, TypeHandle, TypeRegistry,
    Value, ValueType,
};

// Source wrapper that counts how often the cache falls through
#[derive(Default)]
struct CountingSource {
    inner: TypeRegistry,
    finds: AtomicUsize,
    lists: AtomicUsize,
}

impl CountingSource {
    fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

impl MemberSource for CountingSource {
    fn raw_find(
        &self,
        ty: &TypeHandle,
        kind: MemberKind,
        name: &str,
        scope: BindingScope,
    ) -> AccessResult<Option<MemberDescriptor>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.raw_find(ty, kind, name, scope)
    }

    fn raw_list(
        &self,
        ty: &TypeHandle,
        kind: MemberKind,
        scope: BindingScope,
    ) -> AccessResult<Vec<MemberDescriptor>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.raw_list(ty, kind, scope)
    }
}

fn declare_shape(registry: &TypeRegistry) -> (TypeHandle, TypeHandle) {
    let shape = registry
        .define("Shape")
        .field(FieldDef::new("id", ValueType::Int))
        .field(FieldDef::new("secret", ValueType::Str).private())
        .field(FieldDef::new("tag", ValueType::Str).protected())
        .field(FieldDef::new("count", ValueType::Int).as_static())
        .property(PropertyDef::auto("Name", ValueType::Str))
        .method(
            MethodDef::new("Area", |_, _| Ok(Value::Float(0.0))).returns(ValueType::Float),
        )
        .build(registry)
        .unwrap();
    let circle = registry
        .define("Circle")
        .extends(&shape)
        .field(FieldDef::new("radius", ValueType::Float))
        .method(
            MethodDef::new("Area", |_, _| Ok(Value::Float(1.0))).returns(ValueType::Float),
        )
        .build(registry)
        .unwrap();
    (shape, circle)
}

fn names(members: &[MemberDescriptor]) -> HashSet<String> {
    members.iter().map(|m| m.name().to_string()).collect()
}

// ============================================================================
// Source call counting
// ============================================================================

#[test]
fn test_source_consulted_once_per_key() {
    let source = Arc::new(CountingSource::default());
    let (shape, _) = declare_shape(&source.inner);
    let cache = LookupCache::new(source.clone());

    for _ in 0..10 {
        cache.find_field(&shape, "id", BindingScope::default()).unwrap();
        cache.list_fields(&shape, BindingScope::default()).unwrap();
    }

    assert_eq!(source.finds(), 1);
    assert_eq!(source.lists(), 1);
}

#[test]
fn test_absent_member_cached() {
    let source = Arc::new(CountingSource::default());
    let (shape, _) = declare_shape(&source.inner);
    let cache = LookupCache::new(source.clone());

    for _ in 0..5 {
        assert!(cache
            .find_field(&shape, "secret", BindingScope::default())
            .unwrap()
            .is_none());
    }
    assert_eq!(source.finds(), 1);

    // A different scope is a different key
    assert!(cache
        .find_field(&shape, "secret", BindingScope::NON_PUBLIC_INSTANCE)
        .unwrap()
        .is_some());
    assert_eq!(source.finds(), 2);
}

#[test]
fn test_invalid_scope_answer_cached() {
    let source = Arc::new(CountingSource::default());
    let (shape, _) = declare_shape(&source.inner);
    let cache = LookupCache::new(source.clone());

    for _ in 0..3 {
        assert_eq!(
            cache.find_field(&shape, "id", BindingScope::PUBLIC).unwrap_err(),
            AccessError::InvalidScope(BindingScope::PUBLIC)
        );
    }
    assert_eq!(source.finds(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_ambiguous_answer_cached() {
    let source = Arc::new(CountingSource::default());
    let ty = source
        .inner
        .define("Formatter")
        .method(
            MethodDef::new("Format", |_, args| Ok(Value::from(format!("{:?}", args[0]))))
                .param("value", ValueType::Int)
                .returns(ValueType::Str),
        )
        .method(
            MethodDef::new("Format", |_, args| Ok(args[0].clone()))
                .param("value", ValueType::Str)
                .returns(ValueType::Str),
        )
        .build(&source.inner)
        .unwrap();
    let cache = LookupCache::new(source.clone());

    for _ in 0..100 {
        let err = cache.find_method(&ty, "Format", BindingScope::default()).unwrap_err();
        assert!(matches!(err, AccessError::AmbiguousMember { .. }));
    }
    assert_eq!(source.finds(), 1);

    // Overloads stay reachable by signature
    let by_str = cache
        .find_method_by_signature(&ty, "Format", &[ValueType::Str], BindingScope::default())
        .unwrap()
        .unwrap();
    assert_eq!(by_str.info().parameters()[0].ty, ValueType::Str);
}

// ============================================================================
// Equivalence with the source
// ============================================================================

#[test]
fn test_bulk_equivalence() {
    let registry = Arc::new(TypeRegistry::new());
    let (shape, circle) = declare_shape(&registry);
    let cache = LookupCache::new(registry.clone());

    let scopes = [
        BindingScope::default(),
        BindingScope::EVERYTHING,
        BindingScope::PUBLIC_STATIC,
        BindingScope::NON_PUBLIC_INSTANCE,
        BindingScope::EVERYTHING | BindingScope::DECLARED_ONLY,
        BindingScope::EVERYTHING | BindingScope::FLATTEN_HIERARCHY,
    ];
    let kinds = [MemberKind::Field, MemberKind::Property, MemberKind::Method];

    for ty in [&shape, &circle] {
        for kind in kinds {
            for scope in scopes {
                let cached = cache.list_members(ty, kind, scope).unwrap();
                let raw = registry.raw_list(ty, kind, scope).unwrap();
                let cached: HashSet<_> = cached.iter().cloned().collect();
                let raw: HashSet<_> = raw.into_iter().collect();
                assert_eq!(cached, raw, "{} {} {:?}", ty.name(), kind, scope);
            }
        }
    }
}

#[test]
fn test_cold_and_warm_find_agree() {
    let registry = Arc::new(TypeRegistry::new());
    let (_, circle) = declare_shape(&registry);
    let cache = LookupCache::new(registry.clone());

    for name in ["id", "secret", "tag", "count", "radius", "missing"] {
        let cold = cache.find_field(&circle, name, BindingScope::EVERYTHING).unwrap();
        let warm = cache.find_field(&circle, name, BindingScope::EVERYTHING).unwrap();
        let raw = registry
            .raw_find(&circle, MemberKind::Field, name, BindingScope::EVERYTHING)
            .unwrap();
        assert_eq!(cold, warm);
        assert_eq!(cold, raw);
    }
}

// ============================================================================
// Scope filtering through the cache
// ============================================================================

#[test]
fn test_scope_filtering() {
    let registry = Arc::new(TypeRegistry::new());
    let (shape, circle) = declare_shape(&registry);
    let cache = LookupCache::new(registry);

    let public = cache.list_fields(&shape, BindingScope::default()).unwrap();
    assert_eq!(names(&public), HashSet::from(["id".to_string()]));

    let hidden = cache.list_fields(&shape, BindingScope::NON_PUBLIC_INSTANCE).unwrap();
    assert_eq!(names(&hidden), HashSet::from(["secret".to_string(), "tag".to_string()]));

    let statics = cache.list_fields(&shape, BindingScope::PUBLIC_STATIC).unwrap();
    assert_eq!(names(&statics), HashSet::from(["count".to_string()]));

    // Parent privates never show through the subtype
    let inherited = cache.list_fields(&circle, BindingScope::NON_PUBLIC_INSTANCE).unwrap();
    assert_eq!(names(&inherited), HashSet::from(["tag".to_string()]));

    // Inherited statics need FLATTEN_HIERARCHY
    assert!(cache
        .find_field(&circle, "count", BindingScope::PUBLIC_STATIC)
        .unwrap()
        .is_none());
    assert!(cache
        .find_field(
            &circle,
            "count",
            BindingScope::PUBLIC_STATIC | BindingScope::FLATTEN_HIERARCHY
        )
        .unwrap()
        .is_some());
}

#[test]
fn test_derived_method_hides_parent() {
    let registry = Arc::new(TypeRegistry::new());
    let (shape, circle) = declare_shape(&registry);
    let cache = LookupCache::new(registry);

    let area = cache.find_method(&circle, "Area", BindingScope::default()).unwrap().unwrap();
    assert_eq!(area.declaring_type(), &circle);

    let methods = cache.list_methods(&circle, BindingScope::default()).unwrap();
    assert_eq!(methods.len(), 1);

    let base_area = cache.find_method(&shape, "Area", BindingScope::default()).unwrap().unwrap();
    assert_ne!(area, base_area);
}

#[test]
fn test_ignore_case() {
    let registry = Arc::new(TypeRegistry::new());
    let (shape, _) = declare_shape(&registry);
    let cache = LookupCache::new(registry);

    assert!(cache.find_property(&shape, "name", BindingScope::default()).unwrap().is_none());
    let found = cache
        .find_property(&shape, "name", BindingScope::default() | BindingScope::IGNORE_CASE)
        .unwrap()
        .unwrap();
    assert_eq!(found.name(), "Name");
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_lookups_converge() {
    let registry = Arc::new(TypeRegistry::new());
    let (shape, _) = declare_shape(&registry);
    let options = CacheOptions::default().with_shard_amount(4);
    let lookups = LookupCache::with_options(registry.clone(), &options);
    let accessors = AccessorCache::with_options(&options);
    let obj = registry.instantiate(&shape).unwrap();

    let threads = 8;
    let barrier = Barrier::new(threads);

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let (lookups, accessors, barrier, shape, obj) =
                    (&lookups, &accessors, &barrier, &shape, &obj);
                s.spawn(move || {
                    barrier.wait();
                    let id = lookups
                        .find_field(shape, "id", BindingScope::default())
                        .unwrap()
                        .unwrap();
                    let accessor = accessors.get_accessor(&id);
                    if i == 0 {
                        accessor.set(Some(obj), Value::Int(7)).unwrap();
                    }
                    (id, accessor)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let (first_id, first_accessor) = &results[0];
    for (id, accessor) in &results {
        assert_eq!(id, first_id);
        assert!(Arc::ptr_eq(accessor, first_accessor));
    }
    assert_eq!(accessors.len(), 1);
    assert_eq!(first_accessor.get(Some(&obj)).unwrap(), Value::Int(7));

    let stats = lookups.stats();
    assert_eq!(stats.hits + stats.misses, threads as u64);
}
