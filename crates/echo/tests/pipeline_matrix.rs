use echo::codec::{BinaryCodec, BinaryMode, EchoCodec};
use echo::serializer::{field, SerializationContext, Serializer, TypeDescriptor, TypeRegistry};
use echo::{apply_delta, create_delta, ChangeKind, EchoObject};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default, Clone)]
struct Unit {
    name: String,
    health: i32,
    path: Vec<i32>,
}

fn serializer() -> Serializer {
    let types = TypeRegistry::with_builtins();
    types.register_object::<Unit>(
        "demo.Unit",
        TypeDescriptor::new::<Unit>(vec![
            field!(Unit, "Name", name: String),
            field!(Unit, "Health", health: i32),
            field!(Unit, "Path", path: Vec<i32>),
        ]),
    );
    Serializer::with_types(types)
}

#[test]
fn snapshots_sync_through_binary_deltas() {
    let serializer = serializer();
    let mut ctx = SerializationContext::default();
    let before = Unit {
        name: "scout".into(),
        health: 10,
        path: vec![1, 2, 3],
    };
    let after = Unit {
        health: 7,
        path: vec![1, 5],
        ..before.clone()
    };
    let old = serializer.serialize_value(&before, &mut ctx).unwrap();
    let new = serializer.serialize_value(&after, &mut ctx).unwrap();

    let codec = BinaryCodec::new(BinaryMode::Compact);
    let wire = codec.encode(&create_delta(&old, &new).to_echo()).unwrap();
    let received = codec.decode(&wire).unwrap();

    let replica = codec.decode(&codec.encode(&old).unwrap()).unwrap();
    let synced = echo::apply_delta_tree(&replica, &received).unwrap();
    assert_eq!(synced, new);

    let unit: Unit = serializer.deserialize_value(&synced, &mut ctx).unwrap().unwrap();
    assert_eq!(unit.health, 7);
    assert_eq!(unit.path, vec![1, 5]);
}

#[test]
fn applied_deltas_do_not_notify_the_baseline() {
    let base = EchoObject::from_entries([("hp", EchoObject::from(1i32))]).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    base.on_change(move |event| sink.borrow_mut().push(event.kind));

    let target = EchoObject::from_entries([("hp", EchoObject::from(2i32))]).unwrap();
    let patched = apply_delta(&base, &create_delta(&base, &target)).unwrap();
    assert_eq!(patched, target);
    assert!(seen.borrow().is_empty());

    base.find("hp").unwrap().set_value(3i32).unwrap();
    assert_eq!(*seen.borrow(), vec![ChangeKind::ValueChanged]);
}
