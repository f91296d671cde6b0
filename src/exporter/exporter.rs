use std::sync::Arc;
use ipfix::{DataRecord, InfoElement, Registry, SetKind, TemplateRecord, Transport, MIN_TEMPLATE_ID};
use log::{debug, log_enabled, trace, warn, Level::Trace};
use crate::flows::{FlowRecord, FlowRecords};
use super::catalog::{self, Family};
use super::{Error, Rule};

#[derive(Copy, Clone, Debug)]
pub struct Config {
    pub template_id:      u16,
    pub export_frequency: u64,
    pub family:           Family,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum State {
    Uninitialized,
    TemplateSent,
    Exporting,
}

/// Builds and sends the template, then one data record per flow each tick.
///
/// The template is sent on the first tick and again on every tick whose
/// number is a multiple of `export_frequency`; those ticks carry no data.
/// All other ticks send data. An `export_frequency` of 0 disables the
/// periodic resend. Resolved elements are cached in template order and
/// every data record is built by walking that cache.
pub struct FlowExporter<T, R> {
    records:   Arc<FlowRecords>,
    transport: T,
    registry:  R,
    elements:  Vec<InfoElement>,
    config:    Config,
    cycle:     u64,
    state:     State,
}

impl<T: Transport, R: Registry> FlowExporter<T, R> {
    pub fn new(records: Arc<FlowRecords>, transport: T, registry: R, config: Config) -> Result<Self, Error> {
        if config.template_id < MIN_TEMPLATE_ID {
            let msg = format!("template id {} below {}", config.template_id, MIN_TEMPLATE_ID);
            return Err(Error::Config(msg));
        }

        if config.export_frequency == 1 {
            let msg = "export frequency 1 leaves no cycles for data".to_owned();
            return Err(Error::Config(msg));
        }

        catalog::validate(config.family)?;

        Ok(Self {
            records:   records,
            transport: transport,
            registry:  registry,
            elements:  Vec::new(),
            config:    config,
            cycle:     0,
            state:     State::Uninitialized,
        })
    }

    /// Run one export cycle.
    pub fn export(&mut self) -> Result<(), Error> {
        self.cycle += 1;

        if self.template_due() {
            let mut record = TemplateRecord::new(self.config.template_id);
            let bytes = self.send_template(&mut record)?;
            debug!("sent template {} ({} bytes) on cycle {}", self.config.template_id, bytes, self.cycle);
            self.state = State::TemplateSent;
            return Ok(());
        }

        let sent = self.send_flow_records()?;
        debug!("exported {} flow records on cycle {}", sent, self.cycle);
        self.state = State::Exporting;

        self.records.compact();

        Ok(())
    }

    fn template_due(&self) -> bool {
        match self.state {
            State::Uninitialized => true,
            _                    => {
                let freq = self.config.export_frequency;
                freq != 0 && self.cycle % freq == 0
            }
        }
    }

    pub fn send_template(&mut self, record: &mut TemplateRecord) -> Result<usize, Error> {
        for group in &catalog::groups(self.config.family) {
            for &name in group.names {
                let element = self.registry.element(name, group.enterprise).map_err(|e| {
                    Error::Resolution {
                        name:       name.to_owned(),
                        enterprise: group.enterprise,
                        source:     e,
                    }
                })?;
                record.add(element).map_err(Error::Record)?;
            }
        }

        let elements = record.elements().to_vec();
        let bytes = self.transport.send(SetKind::Template, record.finish()).map_err(Error::Transport)?;

        self.elements = elements;

        Ok(bytes)
    }

    pub fn send_data(&mut self, record: &mut DataRecord, flow: &FlowRecord) -> Result<usize, Error> {
        if self.elements.is_empty() {
            return Err(Error::NoTemplate);
        }

        for element in &self.elements {
            let rule  = Rule::lookup(&element.name);
            let rule  = rule.ok_or_else(|| Error::Consistency(element.name.clone()))?;
            let value = rule.extract(flow)?;
            record.add(element, value).map_err(Error::Record)?;
        }

        if log_enabled!(Trace) {
            trace!("flow {}", flow.conn.tuple_orig);
            for field in record.fields() {
                trace!("  {} = {:?}", field.element.name, field.value);
            }
        }

        self.transport.send(SetKind::Data, record.finish()).map_err(Error::Transport)
    }

    /// Send one data record per stored flow. A flow whose record cannot be
    /// built is skipped and keeps its baseline; retired flows that fail are
    /// dropped. A transport failure abandons the rest of the cycle.
    fn send_flow_records(&mut self) -> Result<usize, Error> {
        let records = self.records.clone();
        let mut records = records.lock();

        let mut sent     = 0;
        let mut rejected = Vec::new();

        for (key, flow) in records.iter_mut() {
            let mut record = DataRecord::new(self.config.template_id);
            match self.send_data(&mut record, flow) {
                Ok(_) => {
                    flow.advance();
                    sent += 1;
                },
                Err(e) if e.aborts_cycle() => {
                    warn!("failed to export flow {}: {}", key, e);
                    return Err(e);
                },
                Err(e) => {
                    warn!("skipping flow {}: {}", key, e);
                    if !flow.active {
                        rejected.push(key.clone());
                    }
                }
            }
        }

        for key in &rejected {
            records.remove(key);
        }

        Ok(sent)
    }

    pub fn elements(&self) -> &[InfoElement] {
        &self.elements
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    #[cfg(test)]
    pub(super) fn with_elements(mut self, elements: Vec<InfoElement>) -> Self {
        self.elements = elements;
        self.state    = State::TemplateSent;
        self
    }
}
