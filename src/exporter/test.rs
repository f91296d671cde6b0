use std::cell::RefCell;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::rc::Rc;
use std::sync::Arc;
use anyhow::Result;
use ipfix::*;
use crate::flows::{Connection, FlowRecord, FlowRecords, Tuple};
use super::catalog::{self, Family};
use super::{Config, Error, FlowExporter, State};

const TEMPLATE_ID: u16 = 256;

#[derive(Default)]
struct Sent {
    records: Vec<Record>,
    fail:    Option<SetKind>,
    limit:   Option<usize>,
}

#[derive(Clone, Default)]
struct Memory(Rc<RefCell<Sent>>);

impl Memory {
    fn kinds(&self) -> Vec<SetKind> {
        self.0.borrow().records.iter().map(Record::kind).collect()
    }

    fn last(&self) -> Option<Record> {
        self.0.borrow().records.last().cloned()
    }

    fn fail(&self, kind: Option<SetKind>) {
        self.0.borrow_mut().fail = kind;
    }

    fn data(&self) -> Vec<Vec<Field>> {
        self.0.borrow().records.iter().filter_map(|r| match r {
            Record::Data(d) => Some(d.fields.clone()),
            _               => None,
        }).collect()
    }

    // fail data sends once this many data records went out
    fn limit(&self, limit: usize) {
        self.0.borrow_mut().limit = Some(limit);
    }
}

impl Transport for Memory {
    fn send(&mut self, kind: SetKind, record: Record) -> Result<usize, ipfix::Error> {
        let mut sent = self.0.borrow_mut();
        if sent.fail == Some(kind) {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset").into());
        }
        let (bytes, _) = Message::new(0).encode(&record, 0)?;
        let bytes = bytes.len();
        sent.records.push(record);
        Ok(bytes)
    }
}

struct Missing(&'static str);

impl Registry for Missing {
    fn element(&self, name: &str, enterprise: u32) -> Result<InfoElement, ipfix::Error> {
        match name == self.0 {
            true  => Err(ipfix::Error::Unknown { name: name.to_owned(), enterprise }),
            false => Elements::new().element(name, enterprise),
        }
    }
}

fn config(family: Family, export_frequency: u64) -> Config {
    Config {
        template_id:      TEMPLATE_ID,
        export_frequency: export_frequency,
        family:           family,
    }
}

fn exporter(records: Arc<FlowRecords>, freq: u64) -> Result<(FlowExporter<Memory, Elements>, Memory)> {
    let memory   = Memory::default();
    let exporter = FlowExporter::new(records, memory.clone(), Elements::new(), config(Family::V4, freq))?;
    Ok((exporter, memory))
}

fn fields(record: Option<Record>) -> Vec<Field> {
    match record {
        Some(Record::Data(d)) => d.fields,
        other                 => panic!("expected data record, got {:?}", other),
    }
}

fn value<'a>(fields: &'a [Field], name: &str) -> &'a Value {
    match fields.iter().find(|f| f.element.name == name) {
        Some(f) => &f.value,
        None    => panic!("missing field {}", name),
    }
}

fn conn(port: u16, packets: u64, bytes: u64) -> Connection {
    Connection {
        original_packets: packets,
        original_bytes:   bytes,
        tuple_orig: Tuple {
            source_address: Some(IpAddr::V4(Ipv4Addr::new(10, 10, 0, 1))),
            source_port:    port,
            protocol:       6,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn group_enterprise_ids() -> Result<()> {
    let registry = Elements::new();
    for &family in &[Family::V4, Family::V6] {
        for group in &catalog::groups(family) {
            for name in group.names {
                let element = registry.element(name, group.enterprise)?;
                assert_eq!(element.enterprise, group.enterprise, "{}", name);
                assert_eq!(&element.name, name);
            }
        }
    }
    Ok(())
}

#[test]
fn catalog_rules_complete() -> Result<()> {
    catalog::validate(Family::V4)?;
    catalog::validate(Family::V6)?;

    let expect = catalog::IANA_INFO_ELEMENTS.len()
        + catalog::IANA_REVERSE_INFO_ELEMENTS.len()
        + catalog::ANTREA_INFO_ELEMENTS.len();
    assert_eq!(catalog::len(Family::V4), expect);
    assert_eq!(catalog::len(Family::V4), 23);
    assert_eq!(catalog::len(Family::V6), 23);

    Ok(())
}

#[test]
fn send_template_caches_elements() -> Result<()> {
    let (mut exporter, memory) = exporter(Arc::new(FlowRecords::new()), 12)?;

    let mut record = TemplateRecord::new(TEMPLATE_ID);
    exporter.send_template(&mut record)?;

    let names = exporter.elements().iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, catalog::names(Family::V4).collect::<Vec<_>>());
    assert_eq!(exporter.elements().len(), catalog::len(Family::V4));

    match memory.last() {
        Some(Record::Template(t)) => {
            assert_eq!(t.id, TEMPLATE_ID);
            assert_eq!(t.elements, exporter.elements());
        },
        other => panic!("expected template record, got {:?}", other),
    }

    Ok(())
}

#[test]
fn data_follows_template_order() -> Result<()> {
    let (mut exporter, memory) = exporter(Arc::new(FlowRecords::new()), 12)?;
    exporter.send_template(&mut TemplateRecord::new(TEMPLATE_ID))?;

    let flow = FlowRecord::new(conn(80, 1, 60));
    exporter.send_data(&mut DataRecord::new(TEMPLATE_ID), &flow)?;

    let fields = fields(memory.last());
    assert_eq!(fields.len(), exporter.elements().len());
    for (field, element) in fields.iter().zip(exporter.elements()) {
        assert_eq!(&field.element, element);
    }

    Ok(())
}

#[test]
fn zero_connection_values() -> Result<()> {
    let (mut exporter, memory) = exporter(Arc::new(FlowRecords::new()), 12)?;
    exporter.send_template(&mut TemplateRecord::new(TEMPLATE_ID))?;

    let flow = FlowRecord::new(Connection::default());
    exporter.send_data(&mut DataRecord::new(TEMPLATE_ID), &flow)?;

    for field in fields(memory.last()) {
        let expect = match field.element.kind {
            DataType::DateTimeSeconds => Value::DateTimeSeconds(0),
            DataType::Ipv4Address     => Value::Ipv4(Ipv4Addr::UNSPECIFIED),
            DataType::Ipv6Address     => Value::Ipv6(Ipv6Addr::UNSPECIFIED),
            DataType::Unsigned8       => Value::Unsigned8(0),
            DataType::Unsigned16      => Value::Unsigned16(0),
            DataType::Unsigned32      => Value::Unsigned32(0),
            DataType::Unsigned64      => Value::Unsigned64(0),
            DataType::String          => Value::String(String::new()),
        };
        assert_eq!(field.value, expect, "{}", field.element.name);
    }

    Ok(())
}

#[test]
fn delta_counters() -> Result<()> {
    let (mut exporter, memory) = exporter(Arc::new(FlowRecords::new()), 12)?;
    exporter.send_template(&mut TemplateRecord::new(TEMPLATE_ID))?;

    let mut flow = FlowRecord::new(Connection {
        reverse_packets: 9,
        reverse_bytes:   700,
        ..conn(80, 12, 1000)
    });
    flow.prev_packets         = 5;
    flow.prev_bytes           = 1000;
    flow.prev_reverse_packets = 4;
    flow.prev_reverse_bytes   = 900;

    exporter.send_data(&mut DataRecord::new(TEMPLATE_ID), &flow)?;

    let fields = fields(memory.last());
    assert_eq!(value(&fields, "packetDeltaCount"),        &Value::Unsigned64(7));
    assert_eq!(value(&fields, "octetDeltaCount"),         &Value::Unsigned64(0));
    assert_eq!(value(&fields, "packetTotalCount"),        &Value::Unsigned64(12));
    assert_eq!(value(&fields, "reversePacketDeltaCount"), &Value::Unsigned64(5));
    assert_eq!(value(&fields, "reverseOctetDeltaCount"),  &Value::Unsigned64(0));
    assert_eq!(value(&fields, "reverseOctetTotalCount"),  &Value::Unsigned64(700));

    Ok(())
}

#[test]
fn workload_values() -> Result<()> {
    let (mut exporter, memory) = exporter(Arc::new(FlowRecords::new()), 12)?;
    exporter.send_template(&mut TemplateRecord::new(TEMPLATE_ID))?;

    let mut conn = conn(41000, 3, 180);
    conn.tuple_orig.destination_address  = Some(IpAddr::V4(Ipv4Addr::new(10, 96, 0, 10)));
    conn.tuple_orig.destination_port     = 53;
    conn.tuple_reply.source_address      = Some(IpAddr::V4(Ipv4Addr::new(10, 10, 1, 7)));
    conn.tuple_reply.source_port         = 5353;
    conn.source_pod_name                 = "client".to_owned();
    conn.destination_pod_namespace       = "kube-system".to_owned();
    conn.destination_service_port_name   = "kube-system/kube-dns:dns".to_owned();
    conn.destination_cluster_ip          = Some(IpAddr::V4(Ipv4Addr::new(10, 96, 0, 10)));

    exporter.send_data(&mut DataRecord::new(TEMPLATE_ID), &FlowRecord::new(conn))?;

    let fields = fields(memory.last());
    assert_eq!(value(&fields, "sourceIPv4Address"),          &Value::Ipv4(Ipv4Addr::new(10, 10, 0, 1)));
    assert_eq!(value(&fields, "destinationIPv4Address"),     &Value::Ipv4(Ipv4Addr::new(10, 10, 1, 7)));
    assert_eq!(value(&fields, "sourceTransportPort"),        &Value::Unsigned16(41000));
    assert_eq!(value(&fields, "destinationTransportPort"),   &Value::Unsigned16(5353));
    assert_eq!(value(&fields, "protocolIdentifier"),         &Value::Unsigned8(6));
    assert_eq!(value(&fields, "sourcePodName"),              &Value::String("client".to_owned()));
    assert_eq!(value(&fields, "sourcePodNamespace"),         &Value::String(String::new()));
    assert_eq!(value(&fields, "destinationPodNamespace"),    &Value::String("kube-system".to_owned()));
    assert_eq!(value(&fields, "destinationClusterIP"),       &Value::Ipv4(Ipv4Addr::new(10, 96, 0, 10)));
    assert_eq!(value(&fields, "destinationServicePortName"), &Value::String("kube-system/kube-dns:dns".to_owned()));

    Ok(())
}

#[test]
fn ipv6_family() -> Result<()> {
    let memory = Memory::default();
    let records = Arc::new(FlowRecords::new());
    let mut exporter = FlowExporter::new(records, memory.clone(), Elements::new(), config(Family::V6, 0))?;
    exporter.send_template(&mut TemplateRecord::new(TEMPLATE_ID))?;

    let addr = "fd00::1".parse::<Ipv6Addr>()?;
    let mut conn = Connection::default();
    conn.tuple_orig.source_address = Some(IpAddr::V6(addr));
    conn.destination_cluster_ip    = Some(IpAddr::V4(Ipv4Addr::new(10, 96, 0, 1)));

    exporter.send_data(&mut DataRecord::new(TEMPLATE_ID), &FlowRecord::new(conn))?;

    let fields = fields(memory.last());
    assert_eq!(value(&fields, "sourceIPv6Address"),      &Value::Ipv6(addr));
    assert_eq!(value(&fields, "destinationIPv6Address"), &Value::Ipv6(Ipv6Addr::UNSPECIFIED));
    assert_eq!(value(&fields, "destinationClusterIPv6"), &Value::Ipv6(Ipv4Addr::new(10, 96, 0, 1).to_ipv6_mapped()));

    Ok(())
}

#[test]
fn address_family_mismatch() -> Result<()> {
    let (mut exporter, memory) = exporter(Arc::new(FlowRecords::new()), 12)?;
    exporter.send_template(&mut TemplateRecord::new(TEMPLATE_ID))?;

    let mut conn = Connection::default();
    conn.tuple_orig.source_address = Some(IpAddr::V6(Ipv6Addr::LOCALHOST));

    let err = exporter.send_data(&mut DataRecord::new(TEMPLATE_ID), &FlowRecord::new(conn));
    assert!(matches!(err, Err(Error::Address { name: "sourceIPv4Address", .. })));
    assert_eq!(memory.kinds(), vec![SetKind::Template]);

    Ok(())
}

#[test]
fn resolution_failure() -> Result<()> {
    let memory = Memory::default();
    let records = Arc::new(FlowRecords::new());
    let registry = Missing("sourceTransportPort");
    let mut exporter = FlowExporter::new(records, memory.clone(), registry, config(Family::V4, 12))?;

    let err = exporter.send_template(&mut TemplateRecord::new(TEMPLATE_ID));
    match err {
        Err(Error::Resolution { name, enterprise, .. }) => {
            assert_eq!(name, "sourceTransportPort");
            assert_eq!(enterprise, IANA_ENTERPRISE_ID);
        },
        other => panic!("expected resolution error, got {:?}", other),
    }

    assert!(exporter.elements().is_empty());
    assert!(memory.kinds().is_empty());

    assert!(exporter.export().is_err());
    assert_eq!(exporter.state(), State::Uninitialized);

    Ok(())
}

#[test]
fn unmatched_element() -> Result<()> {
    let (exporter, memory) = exporter(Arc::new(FlowRecords::new()), 12)?;

    let flags = InfoElement::new("tcpControlBits", 6, DataType::Unsigned16, IANA_ENTERPRISE_ID);
    let mut exporter = exporter.with_elements(vec![flags]);

    let flow = FlowRecord::new(Connection::default());
    let err  = exporter.send_data(&mut DataRecord::new(TEMPLATE_ID), &flow);

    assert!(matches!(err, Err(Error::Consistency(ref name)) if name == "tcpControlBits"));
    assert!(memory.kinds().is_empty());

    Ok(())
}

#[test]
fn data_without_template() -> Result<()> {
    let (mut exporter, memory) = exporter(Arc::new(FlowRecords::new()), 12)?;

    let flow = FlowRecord::new(Connection::default());
    let err  = exporter.send_data(&mut DataRecord::new(TEMPLATE_ID), &flow);

    assert!(matches!(err, Err(Error::NoTemplate)));
    assert!(memory.kinds().is_empty());

    Ok(())
}

#[test]
fn transport_failure_keeps_baseline() -> Result<()> {
    let records = Arc::new(FlowRecords::new());
    let (mut exporter, memory) = exporter(records.clone(), 0)?;

    exporter.export()?;
    assert_eq!(exporter.state(), State::TemplateSent);

    records.update(vec![conn(80, 12, 1000)]);
    memory.fail(Some(SetKind::Data));

    assert!(matches!(exporter.export(), Err(Error::Transport(..))));

    let key = conn(80, 0, 0).key();
    let flow = records.lock()[&key].clone();
    assert_eq!(flow.prev_packets, 0);
    assert_eq!(flow.prev_bytes, 0);
    assert_eq!(exporter.state(), State::TemplateSent);

    memory.fail(None);
    exporter.export()?;

    let fields = fields(memory.last());
    assert_eq!(value(&fields, "packetDeltaCount"), &Value::Unsigned64(12));
    assert_eq!(records.lock()[&key].prev_packets, 12);
    assert_eq!(exporter.state(), State::Exporting);

    Ok(())
}

#[test]
fn transport_failure_stops_cycle() -> Result<()> {
    let records = Arc::new(FlowRecords::new());
    let (mut exporter, memory) = exporter(records.clone(), 0)?;
    exporter.export()?;

    let conns = vec![conn(80, 10, 800), conn(81, 20, 900), conn(82, 30, 1000)];
    records.update(conns.clone());

    memory.limit(1);
    assert!(matches!(exporter.export(), Err(Error::Transport(..))));

    let advanced = conns.iter().filter(|c| {
        let flow = records.lock()[&c.key()].clone();
        match flow.prev_packets {
            0 => false,
            n => {
                assert_eq!(n, c.original_packets);
                assert_eq!(flow.prev_bytes, c.original_bytes);
                true
            }
        }
    }).count();

    assert_eq!(advanced, 1);
    assert_eq!(memory.data().len(), 1);
    assert_eq!(exporter.state(), State::TemplateSent);

    Ok(())
}

#[test]
fn bad_flow_skipped() -> Result<()> {
    let records = Arc::new(FlowRecords::new());
    let (mut exporter, memory) = exporter(records.clone(), 0)?;
    exporter.export()?;

    let mut v6 = conn(443, 5, 500);
    v6.tuple_orig.source_address = Some(IpAddr::V6(Ipv6Addr::LOCALHOST));

    let mut conns = vec![conn(80, 10, 800), conn(81, 20, 900), conn(82, 30, 1000)];
    conns.push(v6.clone());
    records.update(conns.clone());

    for _ in 0..2 {
        exporter.export()?;
    }

    assert_eq!(memory.data().len(), 6);
    assert_eq!(exporter.state(), State::Exporting);
    assert_eq!(records.len(), 4);

    let locked = records.lock();
    assert_eq!(locked[&v6.key()].prev_packets, 0);
    for c in &conns[..3] {
        assert_eq!(locked[&c.key()].prev_packets, c.original_packets);
    }
    drop(locked);

    records.update(vec![]);
    exporter.export()?;
    assert!(records.is_empty());

    Ok(())
}

#[test]
fn consecutive_cycles_advance_baseline() -> Result<()> {
    let records = Arc::new(FlowRecords::new());
    let (mut exporter, memory) = exporter(records.clone(), 0)?;

    exporter.export()?;

    records.update(vec![conn(80, 10, 800)]);
    exporter.export()?;
    let first = fields(memory.last());
    assert_eq!(value(&first, "packetDeltaCount"), &Value::Unsigned64(10));
    assert_eq!(value(&first, "octetDeltaCount"),  &Value::Unsigned64(800));

    records.update(vec![conn(80, 25, 2000)]);
    exporter.export()?;
    let fields = fields(memory.last());
    assert_eq!(value(&fields, "packetDeltaCount"), &Value::Unsigned64(15));
    assert_eq!(value(&fields, "octetDeltaCount"),  &Value::Unsigned64(1200));
    assert_eq!(value(&fields, "packetTotalCount"), &Value::Unsigned64(25));

    Ok(())
}

#[test]
fn template_refresh_cadence() -> Result<()> {
    use SetKind::{Data, Template};

    let records = Arc::new(FlowRecords::new());
    records.update(vec![conn(80, 1, 60)]);

    let (mut exporter, memory) = exporter(records, 3)?;
    for _ in 0..6 {
        exporter.export()?;
    }

    assert_eq!(memory.kinds(), vec![Template, Data, Template, Data, Data, Template]);
    assert_eq!(exporter.cycle(), 6);
    assert_eq!(exporter.state(), State::TemplateSent);

    Ok(())
}

#[test]
fn template_failure_keeps_cache() -> Result<()> {
    let (mut exporter, memory) = exporter(Arc::new(FlowRecords::new()), 0)?;

    memory.fail(Some(SetKind::Template));
    assert!(matches!(exporter.export(), Err(Error::Transport(..))));
    assert!(exporter.elements().is_empty());
    assert_eq!(exporter.state(), State::Uninitialized);

    memory.fail(None);
    exporter.export()?;
    assert_eq!(exporter.elements().len(), catalog::len(Family::V4));
    assert_eq!(exporter.state(), State::TemplateSent);

    Ok(())
}

#[test]
fn retired_flows_exported_once_more() -> Result<()> {
    let records = Arc::new(FlowRecords::new());
    let (mut exporter, memory) = exporter(records.clone(), 0)?;
    exporter.export()?;

    records.update(vec![conn(80, 10, 800)]);
    exporter.export()?;

    records.update(vec![conn(80, 14, 900)]);
    records.update(vec![]);
    exporter.export()?;

    let fields = fields(memory.last());
    assert_eq!(value(&fields, "packetDeltaCount"), &Value::Unsigned64(4));
    assert!(records.is_empty());

    Ok(())
}

#[test]
fn invalid_config() {
    let records = Arc::new(FlowRecords::new());

    let mut cfg = config(Family::V4, 12);
    cfg.template_id = 255;
    let err = FlowExporter::new(records.clone(), Memory::default(), Elements::new(), cfg);
    assert!(matches!(err, Err(Error::Config(..))));

    let cfg = config(Family::V4, 1);
    let err = FlowExporter::new(records, Memory::default(), Elements::new(), cfg);
    assert!(matches!(err, Err(Error::Config(..))));
}
