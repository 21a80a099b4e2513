//! NSWorkspace notification observers.
//!
//! Observers are instances of a small Objective-C class whose methods look
//! up their [`Notifier`] in a registry keyed by the observer's address. The
//! registry lock serializes callbacks with deregistration, so once the
//! registration is dropped no callback can reach the notifier.

use std::collections::HashMap;
use std::ffi::CString;
use std::sync::{Mutex, OnceLock};

use objc::declare::ClassDecl;
use objc::runtime::{Class, Object, Sel};
use objc::{class, msg_send, sel, sel_impl};

use crate::notify::{Notification, Notifier, ObserverRegistration};

const OBSERVER_CLASS: &str = "BackdropWorkspaceObserver";

const SPACE_CHANGED: &str = "NSWorkspaceActiveSpaceDidChangeNotification";
const APP_ACTIVATED: &str = "NSWorkspaceDidActivateApplicationNotification";

fn registry() -> &'static Mutex<HashMap<usize, Notifier>> {
    static REGISTRY: OnceLock<Mutex<HashMap<usize, Notifier>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Observe space changes and application activations.
///
/// Notifications are delivered on the main thread, which must run a run
/// loop. Dropping the returned registration removes the observer.
pub fn register_workspace_observers(notifier: Notifier) -> ObserverRegistration {
    let Some(class) = observer_class() else {
        tracing::warn!("Failed to declare {OBSERVER_CLASS}");
        return ObserverRegistration::noop();
    };

    unsafe {
        let workspace: *mut Object = msg_send![class!(NSWorkspace), sharedWorkspace];
        if workspace.is_null() {
            tracing::warn!("Failed to get shared workspace");
            return ObserverRegistration::noop();
        }

        let center: *mut Object = msg_send![workspace, notificationCenter];
        if center.is_null() {
            tracing::warn!("Failed to get workspace notification center");
            return ObserverRegistration::noop();
        }

        let observer: *mut Object = msg_send![class, alloc];
        let observer: *mut Object = msg_send![observer, init];
        if observer.is_null() {
            tracing::warn!("Failed to create workspace observer");
            return ObserverRegistration::noop();
        }

        let key = observer as usize;
        if let Ok(mut observers) = registry().lock() {
            observers.insert(key, notifier);
        }

        for (name, selector) in [
            (SPACE_CHANGED, sel!(spaceChanged:)),
            (APP_ACTIVATED, sel!(applicationActivated:)),
        ] {
            let Some(name) = nsstring(name) else {
                continue;
            };
            let _: () = msg_send![
                center,
                addObserver: observer
                selector: selector
                name: name
                object: std::ptr::null::<Object>()
            ];
        }

        tracing::debug!("Workspace observers registered");

        let token = ObserverToken {
            center: center as usize,
            observer: key,
        };
        ObserverRegistration::new(move || token.remove())
    }
}

/// Addresses of the registered observer and its notification center.
struct ObserverToken {
    center: usize,
    observer: usize,
}

impl ObserverToken {
    fn remove(self) {
        // Hold the registry lock while deregistering so an in-flight
        // callback either finishes first or finds no notifier.
        let mut observers = match registry().lock() {
            Ok(observers) => observers,
            Err(poisoned) => poisoned.into_inner(),
        };

        unsafe {
            let center = self.center as *mut Object;
            let observer = self.observer as *mut Object;
            let _: () = msg_send![center, removeObserver: observer];
            let _: () = msg_send![observer, release];
        }

        observers.remove(&self.observer);
        tracing::debug!("Workspace observers removed");
    }
}

fn observer_class() -> Option<&'static Class> {
    if let Some(class) = Class::get(OBSERVER_CLASS) {
        return Some(class);
    }

    let mut decl = ClassDecl::new(OBSERVER_CLASS, class!(NSObject))?;
    unsafe {
        decl.add_method(
            sel!(spaceChanged:),
            space_changed as extern "C" fn(&Object, Sel, *mut Object),
        );
        decl.add_method(
            sel!(applicationActivated:),
            application_activated as extern "C" fn(&Object, Sel, *mut Object),
        );
    }
    Some(decl.register())
}

extern "C" fn space_changed(this: &Object, _cmd: Sel, _notification: *mut Object) {
    forward(this, Notification::WorkspaceChanged);
}

extern "C" fn application_activated(this: &Object, _cmd: Sel, _notification: *mut Object) {
    forward(this, Notification::ApplicationActivated);
}

fn forward(observer: &Object, notification: Notification) {
    let key = observer as *const Object as usize;
    if let Ok(observers) = registry().lock() {
        if let Some(notifier) = observers.get(&key) {
            notifier.notify(notification);
        }
    }
}

unsafe fn nsstring(value: &str) -> Option<*mut Object> {
    let value = CString::new(value).ok()?;
    let string: *mut Object = msg_send![class!(NSString), stringWithUTF8String: value.as_ptr()];
    (!string.is_null()).then_some(string)
}
