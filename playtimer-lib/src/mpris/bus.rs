//! D-Bus session bus endpoint on top of a blocking `zbus` connection.
//!
//! Method calls are read off the connection's message stream and decoded into
//! [`Call`]s; there is no generated object server, so the dispatch table stays
//! the single source of routing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};
use zbus::blocking::{Connection, MessageIterator};
use zbus::fdo::{self, RequestNameFlags, RequestNameReply};
use zbus::message::{Header, Message, Type as MessageType};
use zbus::zvariant::{ObjectPath, Value};

use crate::constants::{APP_ID, MPRIS_NAME_PREFIX, OBJECT_PATH, PROPERTIES_INTERFACE, TRACK_ID};
use crate::error::PlayerError;

use super::dispatch::{Call, CallArgs, Reply};
use super::properties::{Change, Metadata, PropValue};
use super::{Endpoint, PlayerService};

/// Per-run well-known name, unique per process start.
pub fn service_name() -> String {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_micros())
        .unwrap_or_default();
    format!(
        "{}.{}.run-{}",
        MPRIS_NAME_PREFIX,
        APP_ID,
        micros % 100_000_000
    )
}

/// Session bus connection owning the player's well-known name.
pub struct SessionBus {
    name: String,
    connection: Connection,
    incoming: Mutex<Option<MessageIterator>>,
}

impl SessionBus {
    /// Connect to the session bus and become primary owner of `name`.
    ///
    /// The name is requested with replacement allowed and without queueing;
    /// anything but primary ownership is an error.
    pub fn connect(name: &str) -> Result<Self, PlayerError> {
        let connection =
            Connection::session().map_err(|err| PlayerError::BusConnection(err.to_string()))?;
        // Subscribe before owning the name so no early call is missed.
        let incoming = MessageIterator::from(&connection);

        let flags = RequestNameFlags::AllowReplacement | RequestNameFlags::DoNotQueue;
        let reply = connection
            .request_name_with_flags(name, flags)
            .map_err(|err| PlayerError::NameOwnership(err.to_string()))?;
        if reply != RequestNameReply::PrimaryOwner {
            return Err(PlayerError::NameOwnership(format!(
                "{}: not primary owner ({:?})",
                name, reply
            )));
        }
        info!("owning bus name {}", name);

        Ok(Self {
            name: name.to_string(),
            connection,
            incoming: Mutex::new(Some(incoming)),
        })
    }
}

impl Endpoint for SessionBus {
    fn service_name(&self) -> String {
        self.name.clone()
    }

    fn serve(&self, service: Arc<PlayerService>) -> Result<(), PlayerError> {
        let incoming = self
            .incoming
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| PlayerError::Export("already serving".to_string()))?;
        let connection = self.connection.clone();

        thread::Builder::new()
            .name("mpris-calls".to_string())
            .spawn(move || serve_calls(&connection, incoming, &service))
            .map_err(|err| PlayerError::Export(err.to_string()))?;
        Ok(())
    }

    fn emit_properties_changed(
        &self,
        interface: &str,
        changes: &[Change],
    ) -> Result<(), PlayerError> {
        let invalidated: Vec<&str> = Vec::new();
        self.connection
            .emit_signal(
                None::<&str>,
                OBJECT_PATH,
                PROPERTIES_INTERFACE,
                "PropertiesChanged",
                &(interface, to_dict(changes), invalidated),
            )
            .map_err(|err| PlayerError::Emit(err.to_string()))
    }

    fn close(&self) {
        if let Err(err) = self.connection.clone().close() {
            warn!("closing bus connection: {}", err);
        }
        debug!("released {}", self.name);
    }
}

fn serve_calls(connection: &Connection, incoming: MessageIterator, service: &PlayerService) {
    for message in incoming {
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                warn!("bus read failed: {}", err);
                continue;
            }
        };
        let header = message.header();
        if header.message_type() != MessageType::MethodCall {
            continue;
        }

        let sent = if header.path().map(|path| path.as_str()) != Some(OBJECT_PATH) {
            let path = header.path().map(|path| path.to_string()).unwrap_or_default();
            connection
                .reply_dbus_error(&header, fdo::Error::UnknownObject(path))
                .map(|_| ())
        } else {
            match decode_call(&message, &header) {
                Ok(call) => {
                    let mut sent = Ok(());
                    service.handle(&call, |reply| sent = send_reply(connection, &header, reply));
                    sent
                }
                Err(err) => connection
                    .reply_dbus_error(&header, fdo::Error::InvalidArgs(err.to_string()))
                    .map(|_| ()),
            }
        };
        if let Err(err) = sent {
            warn!("bus reply failed: {}", err);
        }
    }

    debug!("bus message stream ended");
    service.connection_lost();
}

fn decode_call(message: &Message, header: &Header<'_>) -> zbus::Result<Call> {
    let interface = header
        .interface()
        .map(|interface| interface.to_string())
        .unwrap_or_default();
    let member = header
        .member()
        .map(|member| member.to_string())
        .unwrap_or_default();

    let body = message.body();
    let args = match (interface.as_str(), member.as_str()) {
        (PROPERTIES_INTERFACE | "", "Get") => {
            let (interface, name) = body.deserialize::<(String, String)>()?;
            CallArgs::Property { interface, name }
        }
        (PROPERTIES_INTERFACE | "", "GetAll") => CallArgs::Interface(body.deserialize::<String>()?),
        _ => CallArgs::None,
    };

    Ok(Call {
        interface,
        member,
        args,
    })
}

fn send_reply(connection: &Connection, header: &Header<'_>, reply: &Reply) -> zbus::Result<()> {
    let sent = match reply {
        Reply::Ack | Reply::StatusChanged(_) | Reply::Terminate(_) => connection.reply(header, &()),
        Reply::Value(value) => connection.reply(header, &to_value(value)),
        Reply::Values(values) => connection.reply(header, &to_dict(values)),
        Reply::Xml(xml) => connection.reply(header, xml),
        Reply::UnknownMethod(detail) => {
            connection.reply_dbus_error(header, fdo::Error::UnknownMethod(detail.clone()))
        }
        Reply::UnknownProperty(detail) => {
            connection.reply_dbus_error(header, fdo::Error::UnknownProperty(detail.clone()))
        }
        Reply::UnknownInterface(detail) => {
            connection.reply_dbus_error(header, fdo::Error::UnknownInterface(detail.clone()))
        }
    };
    sent.map(|_| ())
}

fn to_dict(changes: &[Change]) -> HashMap<&'static str, Value<'static>> {
    changes
        .iter()
        .map(|(name, value)| (*name, to_value(value)))
        .collect()
}

fn to_value(value: &PropValue) -> Value<'static> {
    match value {
        PropValue::Str(text) => Value::from(text.clone()),
        PropValue::Bool(flag) => Value::from(*flag),
        PropValue::Metadata(metadata) => metadata_value(metadata),
    }
}

fn metadata_value(metadata: &Metadata) -> Value<'static> {
    let mut fields: HashMap<&'static str, Value<'static>> = HashMap::new();
    fields.insert(
        "mpris:trackid",
        Value::from(ObjectPath::from_static_str_unchecked(TRACK_ID)),
    );
    fields.insert("xesam:title", Value::from(metadata.title.clone()));
    fields.insert("xesam:artist", Value::from(metadata.artist.clone()));
    fields.insert("mpris:artUrl", Value::from(metadata.art_url.clone()));
    Value::from(fields)
}
