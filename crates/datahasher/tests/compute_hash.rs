//! End-to-end fingerprints of derived types.

use std::{
    collections::{BTreeMap, HashMap},
    rc::Rc,
    sync::Arc,
};

use datahasher::{
    Error, Fingerprint, StructuralHash, compute_hash, try_compute_hash,
};

/// A simple record.
#[derive(Debug, Clone, PartialEq, Eq, StructuralHash)]
pub struct Person {
    /// The name.
    pub name: String,
    /// The age.
    pub age: u32,
}

fn george() -> Person { Person { name: "George".to_owned(), age: 37 } }

/// A type that lies about its fingerprint.
#[derive(Debug, Clone, StructuralHash)]
#[structural_hash(custom)]
pub struct Liar {
    /// Ignored by the fingerprint.
    pub value: i32,
}

impl Fingerprint for Liar {
    fn fingerprint(&self) -> u64 { 424_242 }
}

/// A leaf record three levels down.
#[derive(Debug, Clone, StructuralHash)]
pub struct Leaf {
    /// The label.
    pub label: String,
    /// The payload mutated by the tests.
    pub count: i64,
}

/// A middle level holding pointers to leaves.
#[derive(Debug, Clone, StructuralHash)]
pub struct Branch {
    /// Boxed leaves, in order.
    pub leaves: Vec<Box<Leaf>>,
}

/// The root of the nested scenario.
#[derive(Debug, Clone, StructuralHash)]
pub struct Tree {
    /// The name.
    pub name: String,
    /// A slice of pointers to structs.
    pub people: Vec<Rc<Person>>,
    /// A map from string to slices of pointers to structs.
    pub groups: HashMap<String, Vec<Rc<Person>>>,
    /// A deeper branch.
    pub branch: Branch,
}

fn build_tree() -> Tree {
    let person =
        |name: &str, age| Rc::new(Person { name: name.to_owned(), age });

    let mut groups = HashMap::new();
    groups.insert(
        "founders".to_owned(),
        vec![person("Ada", 36), person("Grace", 85)],
    );
    groups.insert("staff".to_owned(), vec![person("Linus", 54)]);

    Tree {
        name: "root".to_owned(),
        people: vec![person("George", 37), person("Ada", 36)],
        groups,
        branch: Branch {
            leaves: vec![
                Box::new(Leaf { label: "a".to_owned(), count: 1 }),
                Box::new(Leaf { label: "b".to_owned(), count: 2 }),
            ],
        },
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_hello_world_matches_xxhash() {
    let s = "hello world!";

    assert_eq!(compute_hash(s), xxhash_rust::xxh64::xxh64(s.as_bytes(), 0));
}

#[test]
fn test_person_four_ways() {
    let value = george();
    let pointer = &value;
    let copy = value.clone();
    let fresh = Person { name: "George".to_owned(), age: 37 };

    let by_value = compute_hash(&value);

    assert_ne!(by_value, 0);
    assert_eq!(compute_hash(&pointer), by_value);
    assert_eq!(compute_hash(&copy), by_value);
    assert_eq!(compute_hash(&fresh), by_value);
    assert_eq!(compute_hash(&Box::new(george())), by_value);
    assert_eq!(compute_hash(&Arc::new(george())), by_value);
}

#[test]
fn test_nested_tree_equivalence_and_sensitivity() {
    let first = build_tree();
    let mut second = build_tree();

    assert_eq!(compute_hash(&first), compute_hash(&second));

    second.branch.leaves[1].count += 1;

    assert_ne!(compute_hash(&first), compute_hash(&second));
}

#[test]
fn test_nested_tree_map_value_sensitivity() {
    let first = build_tree();
    let mut second = build_tree();

    let staff = second.groups.get_mut("staff").unwrap();
    staff[0] = Rc::new(Person { name: "Linus".to_owned(), age: 55 });

    assert_ne!(compute_hash(&first), compute_hash(&second));
}

#[test]
fn test_liar_overrides_structure() {
    assert_eq!(compute_hash(&Liar { value: 42 }), 424_242);
    assert_eq!(compute_hash(&Liar { value: 37 }), 424_242);
    assert_eq!(compute_hash(&&Liar { value: 1 }), 424_242);
}

#[test]
fn test_liar_inside_struct_hides_its_fields() {
    /// Wraps a liar.
    #[derive(StructuralHash)]
    struct Holder {
        id: u8,
        liar: Liar,
    }

    assert_eq!(
        compute_hash(&Holder { id: 1, liar: Liar { value: 42 } }),
        compute_hash(&Holder { id: 1, liar: Liar { value: 37 } })
    );
    assert_ne!(
        compute_hash(&Holder { id: 1, liar: Liar { value: 42 } }),
        compute_hash(&Holder { id: 2, liar: Liar { value: 42 } })
    );
}

// =============================================================================
// Derive attributes
// =============================================================================

/// Fields meant to be embedded.
#[derive(Debug, Clone, StructuralHash)]
pub struct Audit {
    /// Author.
    pub created_by: String,
    /// Revision.
    pub revision: u32,
}

/// Embeds [`Audit`].
#[derive(Debug, Clone, StructuralHash)]
pub struct Document {
    /// Title.
    pub title: String,
    /// Embedded audit fields.
    #[structural_hash(flatten)]
    pub audit: Audit,
}

/// Declares the promoted fields of [`Document`] inline.
#[derive(Debug, Clone, StructuralHash)]
pub struct FlatDocument {
    /// Title.
    pub title: String,
    /// Author.
    pub created_by: String,
    /// Revision.
    pub revision: u32,
}

/// Nests [`Audit`] without flattening.
#[derive(Debug, Clone, StructuralHash)]
pub struct NestedDocument {
    /// Title.
    pub title: String,
    /// Nested audit.
    pub audit: Audit,
}

#[test]
fn test_flatten_promotes_fields_in_place() {
    let audit = Audit { created_by: "ada".to_owned(), revision: 3 };
    let document = Document { title: "notes".to_owned(), audit: audit.clone() };
    let flat = FlatDocument {
        title: "notes".to_owned(),
        created_by: "ada".to_owned(),
        revision: 3,
    };
    let nested = NestedDocument { title: "notes".to_owned(), audit };

    assert_eq!(compute_hash(&document), compute_hash(&flat));
    assert_ne!(compute_hash(&document), compute_hash(&nested));
}

#[test]
fn test_flatten_through_box() {
    /// Embeds a boxed audit.
    #[derive(StructuralHash)]
    struct BoxedDocument {
        title: String,
        #[structural_hash(flatten)]
        audit: Box<Audit>,
    }

    let boxed = BoxedDocument {
        title: "notes".to_owned(),
        audit: Box::new(Audit { created_by: "ada".to_owned(), revision: 3 }),
    };
    let flat = FlatDocument {
        title: "notes".to_owned(),
        created_by: "ada".to_owned(),
        revision: 3,
    };

    assert_eq!(compute_hash(&boxed), compute_hash(&flat));
}

#[test]
fn test_skipped_field_does_not_contribute() {
    /// Carries a cache that is not part of its identity.
    #[derive(StructuralHash)]
    struct Cached {
        key: String,
        #[structural_hash(skip)]
        #[allow(dead_code)]
        cache: Vec<u8>,
    }

    /// [`Cached`] without the cache.
    #[derive(StructuralHash)]
    struct Uncached {
        key: String,
    }

    let a = Cached { key: "k".to_owned(), cache: vec![1] };
    let b = Cached { key: "k".to_owned(), cache: vec![2, 3] };

    assert_eq!(compute_hash(&a), compute_hash(&b));
    assert_eq!(compute_hash(&a), compute_hash(&Uncached { key: "k".into() }));
}

#[test]
fn test_private_fields_contribute() {
    mod inner {
        use datahasher::StructuralHash;

        /// Has a private field.
        #[derive(StructuralHash)]
        pub struct Secretive {
            pub visible: u8,
            hidden: u8,
        }

        impl Secretive {
            pub const fn new(visible: u8, hidden: u8) -> Self {
                Self { visible, hidden }
            }
        }
    }

    assert_ne!(
        compute_hash(&inner::Secretive::new(1, 2)),
        compute_hash(&inner::Secretive::new(1, 3))
    );
}

/// A message enum.
#[derive(Debug, Clone, StructuralHash)]
pub enum Message {
    /// No payload.
    Quit,
    /// Unit-like but distinct.
    Ping,
    /// Struct variant.
    Move {
        /// Horizontal.
        x: i32,
        /// Vertical.
        y: i32,
    },
    /// Tuple variant.
    Write(String),
}

#[test]
fn test_enum_variants_are_distinguished() {
    let fingerprints = [
        compute_hash(&Message::Quit),
        compute_hash(&Message::Ping),
        compute_hash(&Message::Move { x: 1, y: 2 }),
        compute_hash(&Message::Move { x: 2, y: 1 }),
        compute_hash(&Message::Write("hi".to_owned())),
        compute_hash(&Message::Write("ho".to_owned())),
    ];

    for (i, a) in fingerprints.iter().enumerate() {
        for b in &fingerprints[i + 1..] {
            assert_ne!(a, b);
        }
    }

    assert_eq!(
        compute_hash(&Message::Write("hi".to_owned())),
        compute_hash(&Message::Write("hi".to_owned()))
    );
}

/// A generic wrapper.
#[derive(Debug, Clone, StructuralHash)]
pub struct Tagged<T> {
    /// The tag.
    pub tag: u16,
    /// The wrapped value.
    pub value: T,
}

/// A tuple struct.
#[derive(Debug, Clone, Copy, StructuralHash)]
pub struct Meters(pub u32);

#[test]
fn test_generic_and_tuple_structs() {
    let a = Tagged { tag: 1, value: vec![Meters(3), Meters(4)] };
    let b = Tagged { tag: 1, value: vec![Meters(3), Meters(4)] };
    let c = Tagged { tag: 1, value: vec![Meters(4), Meters(3)] };

    assert_eq!(compute_hash(&a), compute_hash(&b));
    assert_ne!(compute_hash(&a), compute_hash(&c));
}

#[test]
fn test_maps_of_structs_are_order_independent() {
    let mut forward = HashMap::new();
    let mut backward = BTreeMap::new();

    for age in 0..32u32 {
        forward.insert(age, Person { name: format!("p{age}"), age });
    }
    for age in (0..32u32).rev() {
        backward.insert(age, Person { name: format!("p{age}"), age });
    }

    assert_eq!(compute_hash(&forward), compute_hash(&backward));
}

// =============================================================================
// Failure reporting
// =============================================================================

/// A node that can point back at itself.
#[derive(StructuralHash)]
pub struct Node {
    /// Payload.
    pub value: u32,
    /// Link to the next node.
    pub next: std::cell::RefCell<Option<Rc<Node>>>,
}

#[test]
fn test_cycle_through_derived_type() {
    let a = Rc::new(Node { value: 1, next: std::cell::RefCell::new(None) });
    let b = Rc::new(Node {
        value: 2,
        next: std::cell::RefCell::new(Some(Rc::clone(&a))),
    });
    *a.next.borrow_mut() = Some(Rc::clone(&b));

    assert!(matches!(try_compute_hash(&a), Err(Error::Cycle { .. })));
    assert_eq!(compute_hash(&a), compute_hash(&a));

    a.next.borrow_mut().take();

    assert!(try_compute_hash(&a).is_ok());
    assert!(try_compute_hash(&b).is_ok());
}

/// A singly linked list deep enough to hit the default depth bound.
#[derive(StructuralHash)]
pub struct Link {
    /// The rest of the list.
    pub next: Option<Box<Link>>,
}

#[test]
fn test_default_depth_bound() {
    let mut list = Link { next: None };
    for _ in 0..300 {
        list = Link { next: Some(Box::new(list)) };
    }

    assert_eq!(
        try_compute_hash(&list),
        Err(Error::DepthExceeded {
            max_depth: datahasher::config::DEFAULT_MAX_DEPTH
        })
    );
    assert_eq!(compute_hash(&list), compute_hash(&list));
}
