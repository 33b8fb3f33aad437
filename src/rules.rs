use crate::{
    config::Config,
    models::{
        event::{EventKind, Payload},
        transport::{Channel, TemplateFields},
    },
    utils::{payload_str, payload_str_or},
};

/// Which stored template a delivery renders through. Identifiers come from
/// configuration; the table only names the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    AdminAlert,
    ClientReply,
    AdminSms,
}

impl Template {
    pub fn id<'a>(&self, config: &'a Config) -> &'a str {
        match self {
            Template::AdminAlert => &config.admin_template_id,
            Template::ClientReply => &config.client_template_id,
            Template::AdminSms => &config.sms_template_id,
        }
    }
}

/// Where a delivery goes: the configured admin contact points, or a client
/// address read from the event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Admin,
    AdminPhone,
    PayloadEmail(&'static str),
}

impl Recipient {
    pub fn resolve(&self, payload: &Payload, config: &Config) -> String {
        match self {
            Recipient::Admin => config.admin_email.clone(),
            Recipient::AdminPhone => config.admin_phone.clone(),
            Recipient::PayloadEmail(field) => payload_str(payload, field),
        }
    }
}

type FieldMapper = fn(&Payload, &Config) -> TemplateFields;

/// One planned transport invocation for an event.
pub struct Delivery {
    pub channel: Channel,
    pub template: Template,
    pub recipient: Recipient,
    pub subject: &'static str,
    pub fields: FieldMapper,
}

/// The dispatch rule table. Pure: no side effects, no persisted state.
/// Adding an event kind means adding one arm here; the processor never
/// changes.
pub fn deliveries_for(kind: EventKind, config: &Config) -> Vec<Delivery> {
    match kind {
        EventKind::NewBooking => {
            let mut deliveries = vec![
                Delivery {
                    channel: Channel::Email,
                    template: Template::AdminAlert,
                    recipient: Recipient::Admin,
                    subject: "New Booking Notification",
                    fields: booking_admin_fields,
                },
                Delivery {
                    channel: Channel::Email,
                    template: Template::ClientReply,
                    recipient: Recipient::PayloadEmail("email"),
                    subject: "Booking Confirmation",
                    fields: booking_confirmation_fields,
                },
            ];

            if config.sms_enabled {
                deliveries.push(Delivery {
                    channel: Channel::Sms,
                    template: Template::AdminSms,
                    recipient: Recipient::AdminPhone,
                    subject: "New Booking Alert",
                    fields: booking_sms_fields,
                });
            }

            deliveries
        }
        EventKind::NewMessage => vec![Delivery {
            channel: Channel::Email,
            template: Template::AdminAlert,
            recipient: Recipient::Admin,
            subject: "New Contact Message",
            fields: message_admin_fields,
        }],
        EventKind::NewReview => vec![Delivery {
            channel: Channel::Email,
            template: Template::AdminAlert,
            recipient: Recipient::Admin,
            subject: "New Review Notification",
            fields: review_admin_fields,
        }],
        EventKind::AdminReply => vec![Delivery {
            channel: Channel::Email,
            template: Template::ClientReply,
            recipient: Recipient::PayloadEmail("client_email"),
            subject: "Admin Reply",
            fields: reply_client_fields,
        }],
    }
}

fn booking_summary(payload: &Payload) -> String {
    format!(
        "New booking received for {}.\nGuest: {}\nGuests: {}\nDates: {} to {}\nRequests: {}\nAccess: {}",
        payload_str(payload, "house"),
        payload_str(payload, "name"),
        payload_str(payload, "guests"),
        payload_str(payload, "checkin"),
        payload_str(payload, "checkout"),
        payload_str(payload, "requests"),
        payload_str(payload, "access"),
    )
}

fn booking_details(payload: &Payload) -> String {
    format!(
        "Property: {}\nCheck-in: {}\nCheck-out: {}\nGuests: {}",
        payload_str(payload, "house"),
        payload_str(payload, "checkin"),
        payload_str(payload, "checkout"),
        payload_str(payload, "guests"),
    )
}

fn booking_admin_fields(payload: &Payload, config: &Config) -> TemplateFields {
    let mut fields = TemplateFields::new();
    fields.insert("from_name".to_string(), payload_str(payload, "name"));
    fields.insert("reply_to".to_string(), payload_str(payload, "email"));
    fields.insert("phone".to_string(), payload_str(payload, "phone"));
    fields.insert("house".to_string(), payload_str(payload, "house"));
    fields.insert("guests".to_string(), payload_str(payload, "guests"));
    fields.insert("checkin".to_string(), payload_str(payload, "checkin"));
    fields.insert("checkout".to_string(), payload_str(payload, "checkout"));
    fields.insert("requests".to_string(), payload_str(payload, "requests"));
    fields.insert("access".to_string(), payload_str(payload, "access"));
    fields.insert("message".to_string(), booking_summary(payload));
    fields.insert("admin_link".to_string(), config.admin_link.clone());
    fields
}

fn booking_confirmation_fields(payload: &Payload, config: &Config) -> TemplateFields {
    let message = format!(
        "Dear {},\n\nThank you for booking with {}!\n\nTo confirm your booking, please pay the booking fee to:\n{}\n\nWe will contact you shortly for confirmation.\n\nBest regards,\n{} Team",
        payload_str(payload, "name"),
        config.site_name,
        config.payment_instructions,
        config.site_name,
    );

    let mut fields = TemplateFields::new();
    fields.insert("to_email".to_string(), payload_str(payload, "email"));
    fields.insert("from_name".to_string(), config.site_name.clone());
    fields.insert("booking_details".to_string(), booking_details(payload));
    fields.insert("message".to_string(), message);
    fields.insert(
        "subject".to_string(),
        format!("Booking Confirmation - {}", config.site_name),
    );
    fields
}

fn booking_sms_fields(payload: &Payload, _config: &Config) -> TemplateFields {
    let mut fields = TemplateFields::new();
    fields.insert("message".to_string(), booking_summary(payload));
    fields
}

fn message_admin_fields(payload: &Payload, config: &Config) -> TemplateFields {
    let mut fields = TemplateFields::new();
    fields.insert("from_name".to_string(), payload_str(payload, "name"));
    fields.insert("reply_to".to_string(), payload_str(payload, "email"));
    fields.insert("phone".to_string(), payload_str(payload, "phone"));
    fields.insert("message".to_string(), payload_str(payload, "message"));
    fields.insert("admin_link".to_string(), config.admin_link.clone());
    fields
}

fn review_admin_fields(payload: &Payload, config: &Config) -> TemplateFields {
    let mut fields = TemplateFields::new();
    fields.insert("from_name".to_string(), payload_str(payload, "name"));
    fields.insert("reply_to".to_string(), payload_str(payload, "email"));
    fields.insert("rating".to_string(), payload_str(payload, "rating"));
    fields.insert("review".to_string(), payload_str(payload, "review"));
    fields.insert("admin_link".to_string(), config.admin_link.clone());
    fields
}

fn reply_client_fields(payload: &Payload, config: &Config) -> TemplateFields {
    let mut fields = TemplateFields::new();
    fields.insert(
        "to_email".to_string(),
        payload_str(payload, "client_email"),
    );
    fields.insert(
        "from_name".to_string(),
        format!("{} Admin", config.site_name),
    );
    fields.insert(
        "reply_message".to_string(),
        payload_str(payload, "reply_message"),
    );
    fields.insert(
        "booking_details".to_string(),
        payload_str(payload, "booking_details"),
    );
    fields.insert(
        "admin_name".to_string(),
        payload_str_or(payload, "admin_name", "Admin"),
    );
    fields.insert(
        "subject".to_string(),
        payload_str_or(
            payload,
            "subject",
            &format!("Reply from {}", config.site_name),
        ),
    );
    fields
}
