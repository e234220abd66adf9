#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use oxaxiom::vocab::seq;
use oxaxiom::*;
use std::error::Error;

fn resource(iri: &str) -> NamedResource {
    NamedResource::new_unchecked(iri)
}

fn element(name: &str) -> NamedResource {
    resource(&format!("http://example.com/elements/{name}"))
}

fn simple_descriptor(owner: &NamedResource) -> SimpleListDescriptor {
    SimpleListDescriptor::new(
        owner.clone(),
        Assertion::object_property(seq::HAS_LIST.into_owned(), false),
        Assertion::object_property(seq::HAS_NEXT.into_owned(), false),
    )
}

fn referenced_descriptor(owner: &NamedResource) -> ReferencedListDescriptor {
    ReferencedListDescriptor::new(
        owner.clone(),
        Assertion::object_property(seq::HAS_LIST.into_owned(), false),
        Assertion::object_property(seq::HAS_NEXT.into_owned(), false),
        Assertion::object_property(seq::HAS_CONTENT.into_owned(), false),
    )
}

fn persist_simple(
    connection: &mut MemoryConnector,
    owner: &NamedResource,
    elements: &[NamedResource],
) -> Result<(), ConnectorError> {
    let mut descriptor = SimpleListValueDescriptor::new(simple_descriptor(owner));
    for element in elements {
        descriptor.add_value(element.clone());
    }
    connection.begin()?;
    connection.persist_simple_list(&descriptor)?;
    connection.commit()
}

fn persist_referenced(
    connection: &mut MemoryConnector,
    owner: &NamedResource,
    elements: &[NamedResource],
) -> Result<(), ConnectorError> {
    let mut descriptor = ReferencedListValueDescriptor::new(referenced_descriptor(owner));
    for element in elements {
        descriptor.add_value(element.clone());
    }
    connection.begin()?;
    connection.persist_referenced_list(&descriptor)?;
    connection.commit()
}

fn loaded_simple_elements(
    connection: &MemoryConnector,
    owner: &NamedResource,
) -> Result<Vec<NamedResource>, ConnectorError> {
    Ok(connection
        .load_simple_list(&simple_descriptor(owner))?
        .into_iter()
        .filter_map(|axiom| axiom.value().as_resource().cloned())
        .collect())
}

fn loaded_referenced(
    connection: &MemoryConnector,
    owner: &NamedResource,
) -> Result<Vec<(NamedResource, NamedResource)>, ConnectorError> {
    Ok(connection
        .load_referenced_list(&referenced_descriptor(owner))?
        .into_iter()
        .filter_map(|axiom| {
            let (node, _, value) = axiom.into_parts();
            value.as_resource().cloned().map(|content| (node, content))
        })
        .collect())
}

#[test]
fn simple_list_round_trip_preserves_order() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let mut connection = store.connection();
    let owner = resource("http://example.com/owner");
    let elements: Vec<_> = ["a", "b", "c", "d", "e"].iter().map(|n| element(n)).collect();

    persist_simple(&mut connection, &owner, &elements)?;
    assert_eq!(loaded_simple_elements(&connection, &owner)?, elements);
    Ok(())
}

#[test]
fn empty_simple_list_is_absent() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let mut connection = store.connection();
    let owner = resource("http://example.com/owner");
    persist_simple(&mut connection, &owner, &[])?;
    assert!(loaded_simple_elements(&connection, &owner)?.is_empty());
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn simple_list_update_replaces_and_truncates() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let mut connection = store.connection();
    let owner = resource("http://example.com/owner");
    let original: Vec<_> = ["a", "b", "c", "d", "e"].iter().map(|n| element(n)).collect();
    persist_simple(&mut connection, &owner, &original)?;

    // [a, b, c, d, e] -> [a, x, c]
    let desired = vec![element("a"), element("x"), element("c")];
    let mut descriptor = SimpleListValueDescriptor::new(simple_descriptor(&owner));
    for value in &desired {
        descriptor.add_value(value.clone());
    }
    connection.begin()?;
    connection.update_simple_list(&descriptor)?;
    connection.commit()?;

    assert_eq!(loaded_simple_elements(&connection, &owner)?, desired);
    // the dropped tail leaves no dangling links behind
    assert!(connection
        .find(Some(&element("d")), None, None, &[])?
        .is_empty());
    assert!(connection
        .find(None, None, Some(&Value::Resource(element("e"))), &[])?
        .is_empty());
    Ok(())
}

#[test]
fn simple_list_update_appends_extra_values() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let mut connection = store.connection();
    let owner = resource("http://example.com/owner");
    persist_simple(&mut connection, &owner, &[element("a"), element("b")])?;

    let desired = vec![element("a"), element("b"), element("c"), element("d")];
    let mut descriptor = SimpleListValueDescriptor::new(simple_descriptor(&owner));
    for value in &desired {
        descriptor.add_value(value.clone());
    }
    connection.begin()?;
    connection.update_simple_list(&descriptor)?;
    connection.commit()?;

    assert_eq!(loaded_simple_elements(&connection, &owner)?, desired);
    Ok(())
}

#[test]
fn simple_list_cycle_is_a_fault_not_a_truncation() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let owner = resource("http://example.com/owner");
    let has_list = Assertion::object_property(seq::HAS_LIST.into_owned(), false);
    let has_next = Assertion::object_property(seq::HAS_NEXT.into_owned(), false);
    let a = element("a");
    let b = element("b");
    store.insert(
        Axiom::new(owner.clone(), has_list, Value::Resource(a.clone())),
        None,
    );
    store.insert(
        Axiom::new(a.clone(), has_next.clone(), Value::Resource(b.clone())),
        None,
    );
    store.insert(Axiom::new(b, has_next, Value::Resource(a)), None);

    let connection = store.connection();
    assert!(matches!(
        connection.load_simple_list(&simple_descriptor(&owner)),
        Err(ConnectorError::ListIntegrity { .. })
    ));
    Ok(())
}

#[test]
fn simple_list_fork_is_a_fault() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let owner = resource("http://example.com/owner");
    let has_list = Assertion::object_property(seq::HAS_LIST.into_owned(), false);
    store.insert(
        Axiom::new(
            owner.clone(),
            has_list.clone(),
            Value::Resource(element("a")),
        ),
        None,
    );
    store.insert(
        Axiom::new(owner.clone(), has_list, Value::Resource(element("b"))),
        None,
    );

    let connection = store.connection();
    assert!(matches!(
        connection.load_simple_list(&simple_descriptor(&owner)),
        Err(ConnectorError::ListIntegrity { .. })
    ));
    Ok(())
}

#[test]
fn referenced_list_round_trip_preserves_order() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let mut connection = store.connection();
    let owner = resource("http://example.com/owner");
    let elements: Vec<_> = ["a", "b", "c", "d", "e"].iter().map(|n| element(n)).collect();

    persist_referenced(&mut connection, &owner, &elements)?;
    let loaded = loaded_referenced(&connection, &owner)?;
    let contents: Vec<_> = loaded.iter().map(|(_, content)| content.clone()).collect();
    assert_eq!(contents, elements);
    // sequence nodes are derived from the owner identifier
    for (node, _) in &loaded {
        assert!(node.as_str().starts_with("http://example.com/owner-SEQ_"));
    }
    Ok(())
}

#[test]
fn referenced_list_update_preserves_surviving_node_identity() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let mut connection = store.connection();
    let owner = resource("http://example.com/owner");
    let original: Vec<_> = ["a", "b", "c", "d", "e"].iter().map(|n| element(n)).collect();
    persist_referenced(&mut connection, &owner, &original)?;
    let before = loaded_referenced(&connection, &owner)?;

    // [a, b, c, d, e] -> [a, x, c]: b replaced in place, d and e dropped
    let desired = vec![element("a"), element("x"), element("c")];
    let mut descriptor = ReferencedListValueDescriptor::new(referenced_descriptor(&owner));
    for value in &desired {
        descriptor.add_value(value.clone());
    }
    connection.begin()?;
    connection.update_referenced_list(&descriptor)?;
    connection.commit()?;

    let after = loaded_referenced(&connection, &owner)?;
    let contents: Vec<_> = after.iter().map(|(_, content)| content.clone()).collect();
    assert_eq!(contents, desired);
    // positions 0..3 keep their original sequence nodes
    for position in 0..desired.len() {
        assert_eq!(after[position].0, before[position].0);
    }
    // the dropped tail nodes are gone entirely
    for (node, _) in &before[3..] {
        assert!(connection.find(Some(node), None, None, &[])?.is_empty());
    }
    Ok(())
}

#[test]
fn referenced_list_missing_content_is_a_fault() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let owner = resource("http://example.com/owner");
    let node = resource("http://example.com/owner-SEQ_0");
    store.insert(
        Axiom::new(
            owner.clone(),
            Assertion::object_property(seq::HAS_LIST.into_owned(), false),
            Value::Resource(node),
        ),
        None,
    );

    let connection = store.connection();
    assert!(matches!(
        connection.load_referenced_list(&referenced_descriptor(&owner)),
        Err(ConnectorError::ListIntegrity { .. })
    ));
    Ok(())
}

#[test]
fn lists_are_partitioned_by_context() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::new();
    let mut connection = store.connection();
    let owner = resource("http://example.com/owner");
    let context = resource("http://example.com/contexts/one");

    let mut list = simple_descriptor(&owner);
    list.set_context(Some(context));
    let mut descriptor = SimpleListValueDescriptor::new(list.clone());
    descriptor.add_value(element("a"));
    connection.begin()?;
    connection.persist_simple_list(&descriptor)?;
    connection.commit()?;

    // invisible in the default graph
    assert!(loaded_simple_elements(&connection, &owner)?.is_empty());
    assert_eq!(connection.load_simple_list(&list)?.len(), 1);
    Ok(())
}
