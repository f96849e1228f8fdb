//! Transport-independent routing of method calls.
//!
//! The table maps `(interface, member)` to a plain handler function. A handler
//! only computes a [`Reply`]; side effects that must happen after the caller
//! has its answer (status signals, termination) are described by the reply
//! and carried out by [`PlayerService`](super::PlayerService).

use std::collections::HashMap;

use crate::clock::PlaybackStatus;
use crate::constants::{
    INTROSPECTABLE_INTERFACE, PLAYER_INTERFACE, PROPERTIES_INTERFACE, ROOT_INTERFACE,
};
use crate::player::TerminationKind;

use super::properties::{self, Change, Metadata, PropValue};

/// Operations the dispatch table needs from a timer session.
pub trait PlayerControl: Send + Sync {
    fn name(&self) -> String;
    fn status(&self) -> PlaybackStatus;
    fn metadata(&self) -> Metadata;
    /// Toggle play/pause. `None` when nothing changed.
    fn toggle(&self) -> Option<PlaybackStatus>;
    /// Resume. `None` when already playing or finished.
    fn play(&self) -> Option<PlaybackStatus>;
    /// Pause. `None` when already paused or finished.
    fn pause(&self) -> Option<PlaybackStatus>;
    fn restart(&self) -> bool;
    /// Request the end of the session.
    fn terminate(&self, kind: TerminationKind);
    /// The transport went away while the session was live.
    fn connection_lost(&self);
}

/// Decoded arguments of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArgs {
    None,
    Interface(String),
    Property { interface: String, name: String },
}

/// An inbound method call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// May be empty; the member is then matched on any interface.
    pub interface: String,
    pub member: String,
    pub args: CallArgs,
}

impl Call {
    pub fn new(interface: &str, member: &str) -> Self {
        Self::with_args(interface, member, CallArgs::None)
    }

    pub fn with_args(interface: &str, member: &str, args: CallArgs) -> Self {
        Self {
            interface: interface.to_string(),
            member: member.to_string(),
            args,
        }
    }
}

/// Outcome of a dispatched call.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Empty success reply.
    Ack,
    /// Empty success reply, then an immediate `PlaybackStatus` signal.
    StatusChanged(PlaybackStatus),
    /// Empty success reply, then the session ends.
    Terminate(TerminationKind),
    Value(PropValue),
    Values(Vec<Change>),
    Xml(String),
    UnknownMethod(String),
    UnknownProperty(String),
    UnknownInterface(String),
}

type Handler = fn(&dyn PlayerControl, &CallArgs) -> Reply;

/// Routing table for every exported interface.
pub struct Dispatcher {
    routes: HashMap<&'static str, HashMap<&'static str, Handler>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let mut dispatcher = Self {
            routes: HashMap::new(),
        };

        dispatcher.route(ROOT_INTERFACE, "Raise", |_, _| Reply::Ack);
        dispatcher.route(ROOT_INTERFACE, "Quit", |_, _| {
            Reply::Terminate(TerminationKind::Quit)
        });

        dispatcher.route(PLAYER_INTERFACE, "PlayPause", |control, _| {
            status_reply(control.toggle())
        });
        dispatcher.route(PLAYER_INTERFACE, "Play", |control, _| {
            status_reply(control.play())
        });
        dispatcher.route(PLAYER_INTERFACE, "Pause", |control, _| {
            status_reply(control.pause())
        });
        dispatcher.route(PLAYER_INTERFACE, "Previous", |control, _| {
            control.restart();
            Reply::Ack
        });
        dispatcher.route(PLAYER_INTERFACE, "Next", |_, _| {
            Reply::Terminate(TerminationKind::Next)
        });
        dispatcher.route(PLAYER_INTERFACE, "Stop", |_, _| {
            Reply::Terminate(TerminationKind::Stop)
        });

        dispatcher.route(PROPERTIES_INTERFACE, "Get", get_property);
        dispatcher.route(PROPERTIES_INTERFACE, "GetAll", get_all_properties);
        dispatcher.route(PROPERTIES_INTERFACE, "Set", |_, _| Reply::Ack);

        dispatcher.route(INTROSPECTABLE_INTERFACE, "Introspect", |_, _| {
            Reply::Xml(INTROSPECTION_XML.to_string())
        });

        dispatcher
    }

    fn route(&mut self, interface: &'static str, member: &'static str, handler: Handler) {
        self.routes
            .entry(interface)
            .or_default()
            .insert(member, handler);
    }

    pub fn dispatch(&self, control: &dyn PlayerControl, call: &Call) -> Reply {
        let handler = if call.interface.is_empty() {
            self.routes
                .values()
                .find_map(|members| members.get(call.member.as_str()))
        } else {
            match self.routes.get(call.interface.as_str()) {
                Some(members) => members.get(call.member.as_str()),
                None => return Reply::UnknownInterface(call.interface.clone()),
            }
        };

        match handler {
            Some(handler) => handler(control, &call.args),
            None => Reply::UnknownMethod(format!(
                "no method {} on interface {}",
                call.member, call.interface
            )),
        }
    }
}

fn status_reply(changed: Option<PlaybackStatus>) -> Reply {
    match changed {
        Some(status) => Reply::StatusChanged(status),
        None => Reply::Ack,
    }
}

fn get_property(control: &dyn PlayerControl, args: &CallArgs) -> Reply {
    let CallArgs::Property { interface, name } = args else {
        return Reply::UnknownMethod("Get expects (interface, property)".to_string());
    };

    let value = match interface.as_str() {
        ROOT_INTERFACE => properties::root_property(name),
        PLAYER_INTERFACE => properties::player_property(control, name),
        other => return Reply::UnknownInterface(other.to_string()),
    };
    match value {
        Some(value) => Reply::Value(value),
        None => Reply::UnknownProperty(format!("no property {} on {}", name, interface)),
    }
}

fn get_all_properties(control: &dyn PlayerControl, args: &CallArgs) -> Reply {
    let CallArgs::Interface(interface) = args else {
        return Reply::UnknownMethod("GetAll expects (interface)".to_string());
    };

    match interface.as_str() {
        ROOT_INTERFACE => Reply::Values(properties::root_properties()),
        PLAYER_INTERFACE => Reply::Values(properties::player_properties(control)),
        other => Reply::UnknownInterface(other.to_string()),
    }
}

const INTROSPECTION_XML: &str = r#"<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN"
 "http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd">
<node>
  <interface name="org.freedesktop.DBus.Introspectable">
    <method name="Introspect">
      <arg name="xml_data" type="s" direction="out"/>
    </method>
  </interface>
  <interface name="org.freedesktop.DBus.Properties">
    <method name="Get">
      <arg name="interface_name" type="s" direction="in"/>
      <arg name="property_name" type="s" direction="in"/>
      <arg name="value" type="v" direction="out"/>
    </method>
    <method name="GetAll">
      <arg name="interface_name" type="s" direction="in"/>
      <arg name="properties" type="a{sv}" direction="out"/>
    </method>
    <method name="Set">
      <arg name="interface_name" type="s" direction="in"/>
      <arg name="property_name" type="s" direction="in"/>
      <arg name="value" type="v" direction="in"/>
    </method>
    <signal name="PropertiesChanged">
      <arg name="interface_name" type="s"/>
      <arg name="changed_properties" type="a{sv}"/>
      <arg name="invalidated_properties" type="as"/>
    </signal>
  </interface>
  <interface name="org.mpris.MediaPlayer2">
    <method name="Raise"/>
    <method name="Quit"/>
    <property name="Identity" type="s" access="read"/>
    <property name="DesktopEntry" type="s" access="read"/>
    <property name="CanQuit" type="b" access="read"/>
    <property name="CanRaise" type="b" access="read"/>
    <property name="HasTrackList" type="b" access="read"/>
  </interface>
  <interface name="org.mpris.MediaPlayer2.Player">
    <method name="Next"/>
    <method name="Previous"/>
    <method name="Pause"/>
    <method name="PlayPause"/>
    <method name="Stop"/>
    <method name="Play"/>
    <property name="PlaybackStatus" type="s" access="read"/>
    <property name="Metadata" type="a{sv}" access="read"/>
    <property name="CanGoNext" type="b" access="read"/>
    <property name="CanGoPrevious" type="b" access="read"/>
    <property name="CanPlay" type="b" access="read"/>
    <property name="CanPause" type="b" access="read"/>
    <property name="CanSeek" type="b" access="read"/>
    <property name="CanControl" type="b" access="read"/>
  </interface>
</node>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpris::testing::FakeControl;

    fn property(interface: &str, name: &str) -> Call {
        Call::with_args(
            PROPERTIES_INTERFACE,
            "Get",
            CallArgs::Property {
                interface: interface.to_string(),
                name: name.to_string(),
            },
        )
    }

    #[test]
    fn play_pause_reports_the_new_status() {
        let control = FakeControl::default();
        let dispatcher = Dispatcher::new();

        let reply = dispatcher.dispatch(&control, &Call::new(PLAYER_INTERFACE, "PlayPause"));
        assert_eq!(reply, Reply::StatusChanged(PlaybackStatus::Paused));
        let reply = dispatcher.dispatch(&control, &Call::new(PLAYER_INTERFACE, "PlayPause"));
        assert_eq!(reply, Reply::StatusChanged(PlaybackStatus::Playing));
    }

    #[test]
    fn play_while_playing_is_a_plain_ack() {
        let control = FakeControl::default();
        let reply = Dispatcher::new().dispatch(&control, &Call::new(PLAYER_INTERFACE, "Play"));
        assert_eq!(reply, Reply::Ack);
    }

    #[test]
    fn previous_restarts_without_terminating() {
        let control = FakeControl::default();
        let reply = Dispatcher::new().dispatch(&control, &Call::new(PLAYER_INTERFACE, "Previous"));
        assert_eq!(reply, Reply::Ack);
        assert_eq!(control.restarts(), 1);
        assert!(control.terminated().is_none());
    }

    #[test]
    fn quit_next_and_stop_request_termination() {
        let control = FakeControl::default();
        let dispatcher = Dispatcher::new();
        assert_eq!(
            dispatcher.dispatch(&control, &Call::new(ROOT_INTERFACE, "Quit")),
            Reply::Terminate(TerminationKind::Quit)
        );
        assert_eq!(
            dispatcher.dispatch(&control, &Call::new(PLAYER_INTERFACE, "Next")),
            Reply::Terminate(TerminationKind::Next)
        );
        assert_eq!(
            dispatcher.dispatch(&control, &Call::new(PLAYER_INTERFACE, "Stop")),
            Reply::Terminate(TerminationKind::Stop)
        );
        // Handlers only describe termination.
        assert!(control.terminated().is_none());
    }

    #[test]
    fn raise_and_set_are_no_ops() {
        let control = FakeControl::default();
        let dispatcher = Dispatcher::new();
        assert_eq!(
            dispatcher.dispatch(&control, &Call::new(ROOT_INTERFACE, "Raise")),
            Reply::Ack
        );
        assert_eq!(
            dispatcher.dispatch(&control, &Call::new(PROPERTIES_INTERFACE, "Set")),
            Reply::Ack
        );
    }

    #[test]
    fn get_reads_root_and_player_properties() {
        let control = FakeControl::default();
        let dispatcher = Dispatcher::new();

        assert_eq!(
            dispatcher.dispatch(&control, &property(ROOT_INTERFACE, "Identity")),
            Reply::Value(PropValue::Str("Play Timer".to_string()))
        );
        assert_eq!(
            dispatcher.dispatch(&control, &property(PLAYER_INTERFACE, "CanSeek")),
            Reply::Value(PropValue::Bool(false))
        );
        match dispatcher.dispatch(&control, &property(PLAYER_INTERFACE, "Metadata")) {
            Reply::Value(PropValue::Metadata(metadata)) => {
                assert_eq!(metadata.title, "Tea");
                assert_eq!(metadata.artist, vec!["00:42".to_string()]);
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn get_all_lists_every_player_property() {
        let control = FakeControl::default();
        let call = Call::with_args(
            PROPERTIES_INTERFACE,
            "GetAll",
            CallArgs::Interface(PLAYER_INTERFACE.to_string()),
        );
        let Reply::Values(values) = Dispatcher::new().dispatch(&control, &call) else {
            panic!("expected values");
        };
        let names: Vec<_> = values.iter().map(|(name, _)| *name).collect();
        assert!(names.contains(&"PlaybackStatus"));
        assert!(names.contains(&"CanControl"));
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn unknown_names_map_to_protocol_errors() {
        let control = FakeControl::default();
        let dispatcher = Dispatcher::new();
        assert!(matches!(
            dispatcher.dispatch(&control, &Call::new(PLAYER_INTERFACE, "Seek")),
            Reply::UnknownMethod(_)
        ));
        assert!(matches!(
            dispatcher.dispatch(&control, &property(PLAYER_INTERFACE, "Volume")),
            Reply::UnknownProperty(_)
        ));
        assert!(matches!(
            dispatcher.dispatch(&control, &Call::new("org.example.Nope", "Ping")),
            Reply::UnknownInterface(_)
        ));
    }

    #[test]
    fn calls_without_interface_match_by_member() {
        let control = FakeControl::default();
        let reply = Dispatcher::new().dispatch(&control, &Call::new("", "Introspect"));
        let Reply::Xml(xml) = reply else {
            panic!("expected xml");
        };
        assert!(xml.contains(r#"<interface name="org.mpris.MediaPlayer2.Player">"#));
    }
}
