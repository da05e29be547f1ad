use ls_resource::error::Result;
use ls_resource::{AttributeValue, DataType, Metadata, Node, NodeAttribute, Resource};
use pretty_assertions::assert_eq;

/// Every type with a textual form renders to text that parses back to the same value.
#[test]
fn rendered_values_parse_back() -> Result<()> {
    let samples = [
        (DataType::Byte, "200"),
        (DataType::Short, "-1234"),
        (DataType::UShort, "65535"),
        (DataType::Int, "-2147483648"),
        (DataType::UInt, "4294967295"),
        (DataType::Float, "3.25"),
        (DataType::Double, "0.1"),
        (DataType::IVec3, "1 -2 3"),
        (DataType::Vec4, "0.5 1 1.5 2"),
        (DataType::Mat3x4, "1 2 3 4 5 6 7 8 9 10 11 12"),
        (DataType::Bool, "True"),
        (DataType::Path, "Public/Game/file.lsx"),
        (DataType::ULongLong, "12345678901234"),
        (DataType::ScratchBuffer, "AAECAw=="),
        (DataType::Long, "-9"),
        (DataType::Int8, "-128"),
        (DataType::Uuid, "00112233-4455-6677-8899-aabbccddeeff"),
        (DataType::Int64, "9223372036854775807"),
        (DataType::LSWString, "wide"),
    ];

    for (data_type, text) in samples {
        let value = AttributeValue::parse(data_type, text)?;
        assert!(value.matches(data_type), "{data_type} payload mismatch");
        assert_eq!(value.render(), text, "{data_type} did not round trip");
    }

    Ok(())
}

#[test]
fn every_numeric_type_accepts_empty_text() -> Result<()> {
    for data_type in DataType::ALL.into_iter().filter(|dt| dt.is_numeric()) {
        let value = AttributeValue::parse(data_type, "")?;
        assert_eq!(value.render(), "0");
    }

    Ok(())
}

#[cfg(feature = "serde")]
#[test]
fn resource_serializes() -> serde_json::Result<()> {
    let mut resource = Resource::new(Metadata::from_engine_version(0x4000_001D));
    let mut root = Node::new("Config".into());
    root.attributes.push(NodeAttribute::new(
        "Enabled".into(),
        DataType::Bool,
        AttributeValue::Bool(true),
    ));
    resource.push_node(root, None);

    let json = serde_json::to_value(&resource)?;
    assert_eq!(json["metadata"]["major"], 4);
    assert_eq!(json["metadata"]["build"], 29);
    assert_eq!(json["nodes"][0]["name"], "Config");
    assert_eq!(json["nodes"][0]["attributes"][0]["value"]["Bool"], true);

    let back: Resource = serde_json::from_value(json)?;
    assert_eq!(back, resource);

    Ok(())
}
