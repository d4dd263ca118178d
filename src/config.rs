use std::net::SocketAddr;

use crate::scheduler::PrinterId;

/// One printer in the fleet. The fleet is fixed for the process lifetime;
/// no printer is added, removed, or renamed after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterSpec {
    pub id: PrinterId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub printers: Vec<PrinterSpec>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080"
                .parse()
                .expect("default listen address is valid"),
            printers: default_fleet(),
        }
    }
}

fn default_fleet() -> Vec<PrinterSpec> {
    [
        (1, "Ben's Printer"),
        (2, "Jenn's Printer"),
        (3, "Zach's Printer 1"),
        (4, "Zach's Printer 2"),
    ]
    .into_iter()
    .map(|(id, name)| PrinterSpec {
        id,
        name: name.to_string(),
    })
    .collect()
}

/// Parse a printer fleet from a comma-separated "id:name" list.
/// Invalid entries are logged and skipped.
pub fn parse_printers(printers_str: &str) -> Vec<PrinterSpec> {
    if printers_str.is_empty() {
        return Vec::new();
    }

    printers_str
        .split(',')
        .filter_map(|printer| {
            let entry = printer.trim();
            match entry.split_once(':') {
                Some((id, name)) if !name.is_empty() => {
                    let id: PrinterId = id.parse().ok().or_else(|| {
                        tracing::warn!(printer = entry, "Invalid printer id, expected integer");
                        None
                    })?;
                    Some(PrinterSpec {
                        id,
                        name: name.to_string(),
                    })
                }
                _ => {
                    tracing::warn!(printer = entry, "Invalid printer format, expected id:name");
                    None
                }
            }
        })
        .collect()
}
