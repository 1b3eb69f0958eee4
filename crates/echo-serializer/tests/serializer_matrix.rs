use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use echo_core::{EchoObject, TagType};
use echo_serializer::{
    downcast, field, EchoEnum, Format, Reflect, SerializationContext, SerializeError, Serializer,
    Shared, TypeDescriptor, TypeInfo, TypeMode, TypeRegistry, COMPACT_TYPE_KEY, COMPACT_VALUE_KEY,
    DEPENDENCY_KEY, ID_KEY, REF_KEY, TYPE_KEY,
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Class {
    #[default]
    Warrior,
    Mage,
}

impl EchoEnum for Class {
    fn variant_name(&self) -> &'static str {
        match self {
            Class::Warrior => "Warrior",
            Class::Mage => "Mage",
        }
    }

    fn from_variant_name(name: &str) -> Option<Self> {
        match name {
            "Warrior" => Some(Class::Warrior),
            "Mage" => Some(Class::Mage),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Player {
    name: String,
    health: i32,
    class: Class,
    tags: Vec<String>,
    nickname: Option<String>,
    secret: i32,
    pet: Option<Box<dyn Reflect>>,
    extra: EchoObject,
}

#[derive(Default)]
struct Link {
    label: String,
    next: Option<Shared<Link>>,
}

fn fixture() -> Serializer {
    let types = TypeRegistry::with_builtins();
    types.register_enum::<Class>("game.Class");
    types.register_object::<Player>(
        "game.Player",
        TypeDescriptor::new::<Player>(vec![
            field!(Player, "Name", name: String),
            field!(Player, "Health", health: i32).with_aliases(&["HP", "Hitpoints"]),
            field!(Player, "Class", class: Class),
            field!(Player, "Tags", tags: Vec<String>),
            field!(Player, "Nickname", nickname?: String),
            field!(Player, "Secret", secret: i32)
                .with_guard(|owner| owner.downcast_ref::<Player>().map(|player| player.secret != 0)),
            field!(Player, "Pet", pet dyn),
            field!(Player, "Extra", extra: EchoObject),
        ]),
    );
    types.register_object::<Link>(
        "game.Link",
        TypeDescriptor::new::<Link>(vec![
            field!(Link, "Label", label: String),
            field!(Link, "Next", next: Option<Shared<Link>>),
        ]),
    );
    types.register_shared::<Link>();
    Serializer::with_types(types)
}

fn player() -> Player {
    Player {
        name: "Ada".into(),
        health: 100,
        class: Class::Mage,
        tags: vec!["fast".into(), "calm".into()],
        ..Player::default()
    }
}

#[test]
fn matching_declared_type_omits_the_envelope() {
    let serializer = fixture();
    let mut ctx = SerializationContext::default();
    let tree = serializer.serialize_value(&player(), &mut ctx).unwrap();
    assert!(!tree.contains(TYPE_KEY));
    assert_eq!(tree.find("Name").unwrap().get_value(String::new()), "Ada");
    assert_eq!(tree.find("Health").unwrap().tag_type(), TagType::Int);
    assert_eq!(tree.find("Class").unwrap().get_value(String::new()), "Mage");
    assert_eq!(tree.find("Tags/1").unwrap().get_value(String::new()), "calm");
    assert!(tree.find("Nickname").unwrap().is_null());
    assert!(tree.find("Pet").unwrap().is_null());
}

#[test]
fn dynamic_declared_type_writes_the_envelope() {
    let serializer = fixture();
    let mut ctx = SerializationContext::default();
    let tree = serializer.serialize_dyn(&player(), &mut ctx).unwrap();
    assert_eq!(tree.names().unwrap().first().map(String::as_str), Some(TYPE_KEY));
    assert_eq!(tree.find(TYPE_KEY).unwrap().get_value(String::new()), "game.Player");

    let back = serializer
        .deserialize(Some(&tree), TypeInfo::dynamic(), &mut ctx)
        .unwrap()
        .unwrap();
    let back = downcast::<Player>(back).unwrap();
    assert_eq!(back.name, "Ada");
    assert_eq!(back.class, Class::Mage);
    assert_eq!(back.tags, vec!["fast".to_string(), "calm".to_string()]);
}

#[test]
fn simple_values_use_the_compact_envelope() {
    let serializer = fixture();
    let mut ctx = SerializationContext::default();
    let cases: Vec<(Box<dyn Reflect>, &str)> = vec![
        (Box::new(7i32), "i"),
        (Box::new(7u64), "ul"),
        (Box::new(1.5f64), "d"),
        (Box::new(true), "bl"),
        (Box::new(Class::Warrior), "e:game.Class"),
        (Box::new(Uuid::new_v4()), "g"),
    ];
    for (value, code) in cases {
        let tree = serializer.serialize_dyn(&*value, &mut ctx).unwrap();
        assert_eq!(tree.len(), 2, "{code}");
        assert_eq!(tree.find(COMPACT_TYPE_KEY).unwrap().get_value(String::new()), code);
        let back = serializer
            .deserialize(Some(&tree), TypeInfo::dynamic(), &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!((*back).type_info(), (*value).type_info(), "{code}");
    }
}

#[test]
fn strings_are_never_wrapped() {
    let serializer = fixture();
    for mode in [TypeMode::Auto, TypeMode::Aggressive] {
        let mut ctx = SerializationContext::new(mode);
        let tree = serializer.serialize_dyn(&"plain".to_string(), &mut ctx).unwrap();
        assert_eq!(tree.tag_type(), TagType::String);
        let back = serializer
            .deserialize(Some(&tree), TypeInfo::dynamic(), &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(downcast::<String>(back).unwrap(), "plain");
    }
}

#[test]
fn aggressive_mode_wraps_everything_and_reads_back() {
    let serializer = fixture();
    let mut ctx = SerializationContext::new(TypeMode::Aggressive);
    let tree = serializer.serialize_value(&player(), &mut ctx).unwrap();
    assert!(tree.contains(TYPE_KEY));
    let health = tree.find("Health").unwrap();
    assert_eq!(health.find(COMPACT_TYPE_KEY).unwrap().get_value(String::new()), "i");
    assert_eq!(health.find(COMPACT_VALUE_KEY).unwrap().get_value(0i32), 100);
    assert_eq!(tree.find("Name").unwrap().tag_type(), TagType::String);

    let back: Player = serializer.deserialize_value(&tree, &mut ctx).unwrap().unwrap();
    assert_eq!(back.health, 100);
    assert_eq!(back.class, Class::Mage);
}

#[test]
fn none_mode_drops_type_information() {
    let serializer = fixture();
    let mut ctx = SerializationContext::new(TypeMode::None);
    let mut subject = player();
    subject.pet = Some(Box::new(7i64));
    let tree = serializer.serialize_value(&subject, &mut ctx).unwrap();
    let pet = tree.find("Pet").unwrap();
    assert_eq!(pet.tag_type(), TagType::Long);

    let back: Player = serializer.deserialize_value(&tree, &mut ctx).unwrap().unwrap();
    let pet = back.pet.unwrap();
    assert_eq!(downcast::<i64>(pet).unwrap(), 7);
}

#[test]
fn dynamic_fields_keep_their_runtime_type() {
    let serializer = fixture();
    let mut ctx = SerializationContext::default();
    let mut subject = player();
    subject.pet = Some(Box::new(Class::Warrior));
    let tree = serializer.serialize_value(&subject, &mut ctx).unwrap();
    let pet = tree.find("Pet").unwrap();
    assert_eq!(pet.find(COMPACT_TYPE_KEY).unwrap().get_value(String::new()), "e:game.Class");

    let back: Player = serializer.deserialize_value(&tree, &mut ctx).unwrap().unwrap();
    assert_eq!(downcast::<Class>(back.pet.unwrap()).unwrap(), Class::Warrior);
}

#[test]
fn optional_fields_and_guards() {
    let serializer = fixture();
    let mut ctx = SerializationContext::default();
    let mut subject = player();
    let tree = serializer.serialize_value(&subject, &mut ctx).unwrap();
    assert!(!tree.contains("Secret"));

    subject.secret = 42;
    subject.nickname = Some("A".into());
    let tree = serializer.serialize_value(&subject, &mut ctx).unwrap();
    assert_eq!(tree.find("Secret").unwrap().get_value(0i32), 42);
    let back: Player = serializer.deserialize_value(&tree, &mut ctx).unwrap().unwrap();
    assert_eq!(back.nickname.as_deref(), Some("A"));
    assert_eq!(back.secret, 42);
}

#[test]
fn aliases_are_read_in_order() {
    let serializer = fixture();
    let mut ctx = SerializationContext::default();
    let cases = [
        (vec![("HP", 5i32)], 5),
        (vec![("Hitpoints", 6)], 6),
        (vec![("Hitpoints", 6), ("HP", 5)], 5),
        (vec![("HP", 5), ("Health", 9)], 9),
    ];
    for (stored, expected) in cases {
        let tree =
            EchoObject::from_entries(stored.into_iter().map(|(k, v)| (k, EchoObject::from(v)))).unwrap();
        let back: Player = serializer.deserialize_value(&tree, &mut ctx).unwrap().unwrap();
        assert_eq!(back.health, expected);
    }
}

#[test]
fn unresolved_type_names_fall_back_to_the_declared_type() {
    let serializer = fixture();
    let mut ctx = SerializationContext::default();
    let compact = EchoObject::from_entries([
        (COMPACT_TYPE_KEY, EchoObject::from("zz.Unknown")),
        (COMPACT_VALUE_KEY, EchoObject::from(7i32)),
    ])
    .unwrap();
    let value: i32 = serializer.deserialize_value(&compact, &mut ctx).unwrap().unwrap();
    assert_eq!(value, 7);

    let full = EchoObject::from_entries([
        (TYPE_KEY, EchoObject::from("game.Renamed")),
        ("Name", EchoObject::from("Bo")),
    ])
    .unwrap();
    let back: Player = serializer.deserialize_value(&full, &mut ctx).unwrap().unwrap();
    assert_eq!(back.name, "Bo");
}

#[test]
fn shared_cycles_are_written_once() {
    let serializer = fixture();
    let a = Rc::new(RefCell::new(Link {
        label: "a".into(),
        next: None,
    }));
    let b = Rc::new(RefCell::new(Link {
        label: "b".into(),
        next: Some(a.clone()),
    }));
    a.borrow_mut().next = Some(b.clone());

    let mut ctx = SerializationContext::default();
    let tree = serializer.serialize_value(&a, &mut ctx).unwrap();
    assert_eq!(tree.names().unwrap().first().map(String::as_str), Some(ID_KEY));
    assert_eq!(tree.find(ID_KEY).unwrap().get_value(0u32), 1);
    assert_eq!(tree.find("Next/$id").unwrap().get_value(0u32), 2);
    assert_eq!(tree.find("Next/Next/$ref").unwrap().get_value(0u32), 1);

    let mut ctx = SerializationContext::default();
    let back: Shared<Link> = serializer.deserialize_value(&tree, &mut ctx).unwrap().unwrap();
    let second = back.borrow().next.clone().unwrap();
    assert_eq!(second.borrow().label, "b");
    let third = second.borrow().next.clone().unwrap();
    assert!(Rc::ptr_eq(&back, &third));

    a.borrow_mut().next = None;
    back.borrow_mut().next = None;
}

#[test]
fn repeated_shared_values_become_references() {
    let serializer = fixture();
    let shared = Rc::new(RefCell::new(Link {
        label: "leaf".into(),
        next: None,
    }));
    let list = vec![shared.clone(), shared.clone()];
    let mut ctx = SerializationContext::default();
    let tree = serializer.serialize_value(&list, &mut ctx).unwrap();
    assert!(tree.find("0").unwrap().contains(ID_KEY));
    assert!(tree.find("1").unwrap().contains(REF_KEY));

    let mut ctx = SerializationContext::default();
    let back: Vec<Shared<Link>> = serializer.deserialize_value(&tree, &mut ctx).unwrap().unwrap();
    assert!(Rc::ptr_eq(&back[0], &back[1]));
}

#[test]
fn embedded_trees_report_dependencies() {
    let serializer = fixture();
    let id = Uuid::new_v4();
    let mut subject = player();
    subject.extra = EchoObject::from_entries([(
        "texture",
        EchoObject::from_entries([(DEPENDENCY_KEY, EchoObject::from(id.to_string()))]).unwrap(),
    )])
    .unwrap();

    let mut ctx = SerializationContext::default();
    ctx.begin_dependency_scope();
    let tree = serializer.serialize_value(&subject, &mut ctx).unwrap();
    let found = ctx.end_dependency_scope().unwrap();
    assert!(found.contains(&id));
    assert_eq!(tree.find("Extra/texture/$dep").unwrap().get_value(String::new()), id.to_string());
    assert!(!tree.find("Extra").unwrap().ptr_eq(&subject.extra));
}

#[test]
fn sequences_reject_null_elements() {
    let serializer = fixture();
    let mut ctx = SerializationContext::default();
    let tree = EchoObject::from_items([EchoObject::from(1i32), EchoObject::null()]).unwrap();
    let result = serializer.deserialize_value::<Vec<i32>>(&tree, &mut ctx);
    assert!(matches!(result, Err(SerializeError::Decode(_))));
}

#[test]
fn unregistered_types_are_unsupported() {
    #[derive(Default)]
    struct Opaque;
    let serializer = fixture();
    let mut ctx = SerializationContext::default();
    match serializer.serialize_value(&Opaque, &mut ctx) {
        Err(SerializeError::UnsupportedType { type_name }) => assert!(type_name.contains("Opaque")),
        other => panic!("expected UnsupportedType, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn enums_must_be_stored_as_names() {
    let serializer = fixture();
    let mut ctx = SerializationContext::default();
    let wrong = EchoObject::from(1i32);
    assert!(serializer.deserialize_value::<Class>(&wrong, &mut ctx).is_err());
    let unknown = EchoObject::from("Rogue");
    assert!(serializer.deserialize_value::<Class>(&unknown, &mut ctx).is_err());
}

struct Shout;

impl Format for Shout {
    fn name(&self) -> &str {
        "shout"
    }

    fn can_handle(&self, ty: TypeInfo, _types: &TypeRegistry) -> bool {
        ty == TypeInfo::of::<String>()
    }

    fn serialize(
        &self,
        _serializer: &Serializer,
        _ty: TypeInfo,
        value: &dyn Reflect,
        _ctx: &mut SerializationContext,
    ) -> Result<EchoObject, SerializeError> {
        let text = value.as_any().downcast_ref::<String>().cloned().unwrap_or_default();
        Ok(EchoObject::from(format!("{text}!")))
    }

    fn deserialize(
        &self,
        _serializer: &Serializer,
        node: &EchoObject,
        _ty: TypeInfo,
        _ctx: &mut SerializationContext,
    ) -> Result<Option<Box<dyn Reflect>>, SerializeError> {
        let text = node.get_value(String::new());
        Ok(Some(Box::new(text.trim_end_matches('!').to_string())))
    }
}

#[test]
fn user_formats_take_precedence() {
    let serializer = fixture();
    let mut ctx = SerializationContext::default();
    let before = serializer.serialize_value(&player(), &mut ctx).unwrap();
    assert_eq!(before.find("Name").unwrap().get_value(String::new()), "Ada");

    serializer.formats().register(Arc::new(Shout));
    let after = serializer.serialize_value(&player(), &mut ctx).unwrap();
    assert_eq!(after.find("Name").unwrap().get_value(String::new()), "Ada!");
    let back: Player = serializer.deserialize_value(&after, &mut ctx).unwrap().unwrap();
    assert_eq!(back.name, "Ada");
}
