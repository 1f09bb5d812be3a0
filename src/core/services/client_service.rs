//! Validated CRUD helpers for clients.

use tracing::info;

use crate::errors::BillingError;
use crate::ledger::{Client, Ledger};

use super::{ServiceError, ServiceResult};

/// Form data for creating or overwriting a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientDraft {
    pub name: String,
    pub company: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub gst: Option<String>,
}

impl ClientDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Starts an edit from the client's current values.
    pub fn from_client(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            company: client.company.clone(),
            contact: client.contact.clone(),
            email: client.email.clone(),
            address: client.address.clone(),
            gst: client.gst.clone(),
        }
    }

    fn validated(self) -> ServiceResult<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Invalid("Client name is required".into()));
        }
        let email = normalize(self.email);
        if let Some(address) = email.as_deref() {
            if !is_plausible_email(address) {
                return Err(ServiceError::Invalid(format!(
                    "`{}` is not a valid email address",
                    address
                )));
            }
        }
        Ok(Self {
            name,
            company: normalize(self.company),
            contact: normalize(self.contact),
            email,
            address: normalize(self.address),
            gst: normalize(self.gst),
        })
    }

    fn apply(self, client: &mut Client) {
        client.name = self.name;
        client.company = self.company;
        client.contact = self.contact;
        client.email = self.email;
        client.address = self.address;
        client.gst = self.gst;
    }
}

pub struct ClientService;

impl ClientService {
    pub fn add(ledger: &mut Ledger, draft: ClientDraft) -> ServiceResult<u64> {
        let draft = draft.validated()?;
        let mut client = Client::new(String::new());
        draft.apply(&mut client);
        let id = ledger.add_client(client);
        info!(client_id = id, "client added");
        Ok(id)
    }

    /// Overwrites every field of the client; the identifier is preserved.
    pub fn edit(ledger: &mut Ledger, id: u64, draft: ClientDraft) -> ServiceResult<()> {
        let draft = draft.validated()?;
        let client = ledger
            .client_mut(id)
            .ok_or(BillingError::ClientNotFound(id))?;
        draft.apply(client);
        ledger.touch();
        info!(client_id = id, "client updated");
        Ok(())
    }

    /// Removes the client. Bills keep their reference and name snapshot.
    pub fn remove(ledger: &mut Ledger, id: u64) -> ServiceResult<Client> {
        let removed = ledger
            .remove_client(id)
            .ok_or(BillingError::ClientNotFound(id))?;
        info!(client_id = id, "client removed");
        Ok(removed)
    }

    pub fn get(ledger: &Ledger, id: u64) -> ServiceResult<&Client> {
        ledger
            .client(id)
            .ok_or_else(|| BillingError::ClientNotFound(id).into())
    }

    pub fn list(ledger: &Ledger) -> Vec<&Client> {
        ledger.clients.iter().collect()
    }

    pub fn bill_count(ledger: &Ledger, id: u64) -> usize {
        ledger.bills.iter().filter(|bill| bill.client_id == id).count()
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn is_plausible_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !value.contains(' ')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_trims_and_drops_blank_fields() {
        let mut ledger = Ledger::new("Clients");
        let draft = ClientDraft {
            name: "  Ravi Logistics ".into(),
            company: Some("   ".into()),
            email: Some("ops@ravi.in".into()),
            ..ClientDraft::default()
        };
        let id = ClientService::add(&mut ledger, draft).unwrap();
        let client = ClientService::get(&ledger, id).unwrap();
        assert_eq!(client.name, "Ravi Logistics");
        assert!(client.company.is_none());
        assert_eq!(client.email.as_deref(), Some("ops@ravi.in"));
    }

    #[test]
    fn rejects_blank_name_and_bad_email() {
        let mut ledger = Ledger::new("Clients");
        let err = ClientService::add(&mut ledger, ClientDraft::named(" ")).unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(ref message) if message.contains("name")));

        for email in ["ops", "@ravi.in", "ops@", "a@b@c"] {
            let draft = ClientDraft {
                email: Some(email.into()),
                ..ClientDraft::named("Ravi")
            };
            assert!(ClientService::add(&mut ledger, draft).is_err(), "{email} accepted");
        }
        assert!(ledger.clients.is_empty());
    }

    #[test]
    fn edit_overwrites_and_keeps_id() {
        let mut ledger = Ledger::new("Clients");
        let draft = ClientDraft {
            gst: Some("29ABCDE1234F1Z5".into()),
            ..ClientDraft::named("Acme")
        };
        let id = ClientService::add(&mut ledger, draft).unwrap();
        ClientService::edit(&mut ledger, id, ClientDraft::named("Acme Freight")).unwrap();
        let client = ClientService::get(&ledger, id).unwrap();
        assert_eq!(client.id, id);
        assert_eq!(client.name, "Acme Freight");
        assert!(client.gst.is_none());
    }

    #[test]
    fn missing_client_reports_not_found() {
        let mut ledger = Ledger::new("Clients");
        let err = ClientService::remove(&mut ledger, 9).unwrap_err();
        assert!(matches!(err, ServiceError::Core(BillingError::ClientNotFound(9))));
    }
}
