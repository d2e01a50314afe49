/// Implements [`Event`](crate::event::Event) for a struct that embeds an
/// [`EventFlags`](crate::event::EventFlags) field.
///
/// # Syntax
///
/// The flags field is named `flags` unless given explicitly:
/// ```rust,ignore
/// impl_event!(MyEvent);
/// impl_event!(MyOtherEvent, state);
/// ```
///
/// # Example
///
/// ```rust
/// use event_dispatch::event::Event;
/// use event_dispatch::event::EventFlags;
/// use event_dispatch::impl_event;
///
/// struct Saving {
///     target: String,
///     flags: EventFlags,
/// }
///
/// impl_event!(Saving);
///
/// let mut event = Saving { target: "notes.md".to_string(), flags: EventFlags::new() };
/// event.cancel();
/// assert!(event.is_canceled());
/// assert_eq!(event.target, "notes.md");
/// ```
#[macro_export]
macro_rules! impl_event {
    ($name:ty) => {
        $crate::impl_event!($name, flags);
    };

    ($name:ty, $field:ident) => {
        impl $crate::event::Event for $name {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn flags(&self) -> &$crate::event::EventFlags {
                &self.$field
            }

            fn flags_mut(&mut self) -> &mut $crate::event::EventFlags {
                &mut self.$field
            }
        }
    };
}
