use crate::infra::{in_memory_services, InMemoryNotifications};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use clap::Args;
use propease::accounting::{PaymentFilters, DEFAULT_PER_PAGE};
use propease::config::AppConfig;
use propease::domain::{
    LeaseDraft, NewListing, NewPayment, PaymentType, PropertyType, Role,
};
use propease::error::AppError;
use propease::money::{format_usd, Cents};
use propease::services::{CustomLeaseRequest, NewUser, ServiceError, Services, SignLease};
use propease::session::Session;
use propease::uploads::{LocalFile, UploadKind};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reporting date for the accounting summary (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Local file to attach as the rent receipt. A placeholder PDF is used otherwise.
    #[arg(long)]
    pub(crate) receipt: Option<PathBuf>,
    /// Print the notification inbox of both accounts at the end.
    #[arg(long)]
    pub(crate) show_notifications: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let notifications = Arc::new(InMemoryNotifications::default());
    let services = in_memory_services(&config, notifications.clone());
    let now = Utc::now();
    let today = args.today.unwrap_or_else(|| now.date_naive());

    println!("== PropEase demo ==");
    let landlord = account(&services, Role::Admin, "Morgan Reyes", "morgan@propease.test")?;
    let tenant = account(&services, Role::Tenant, "Jordan Lee", "jordan@example.com")?;
    println!("Signed in landlord and tenant");

    let listing = services.listings.create(
        &landlord,
        NewListing {
            title: "Maple Court 2B".to_string(),
            address: "44 Maple Ct, Des Moines, IA".to_string(),
            rent: Cents(145_000),
            property_type: PropertyType::Apartment,
            image_urls: Vec::new(),
            amenities: vec!["Laundry".to_string(), "Parking".to_string()],
        },
        now,
    )?;
    println!("Listed {} at {} / month", listing.title, format_usd(listing.rent));

    let lease_document = store(
        &services,
        &landlord,
        UploadKind::CustomLease,
        LocalFile::new("maple-court-lease.pdf", "application/pdf", b"%PDF-1.7 lease".to_vec()),
    )?;
    let start = first_of_next_month(today);
    let lease = services.leases.create_custom(
        &landlord,
        CustomLeaseRequest {
            draft: LeaseDraft {
                listing_id: listing.id,
                tenant_name: "Jordan Lee".to_string(),
                tenant_email: "jordan@example.com".to_string(),
                start_date: start,
                end_date: start + Duration::days(364),
                rent: listing.rent,
                security_deposit: listing.rent,
                payment_due_day: 1,
                late_fee: Some(Cents(5_000)),
            },
            document_url: lease_document,
        },
        now,
    )?;
    let invite = services.leases.invite(&landlord, &lease.id, now)?;
    let lease = services.leases.sign(
        &invite.token,
        Some(&tenant),
        SignLease {
            signer_name: "Jordan Lee".to_string(),
            signed_document_url: None,
        },
        now,
    )?;
    println!(
        "Lease {} signed: {} through {} ({:?})",
        lease.id, lease.start_date, lease.end_date, lease.status
    );

    let payment = services.payments.create(
        &landlord,
        NewPayment {
            tenant_id: None,
            lease_id: Some(lease.id),
            listing_id: None,
            amount: lease.rent,
            payment_type: PaymentType::Rent,
            due_date: start,
            description: Some("First month".to_string()),
        },
        now,
    )?;
    println!("Billed {} due {}", format_usd(payment.amount), payment.due_date);

    let receipt_file = match args.receipt {
        Some(path) => {
            let bytes = std::fs::read(&path)?;
            let content_type = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .essence_str()
                .to_string();
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "receipt".to_string());
            LocalFile::new(name, content_type, bytes)
        }
        None => LocalFile::new("receipt.pdf", "application/pdf", b"%PDF-1.7 receipt".to_vec()),
    };
    let receipt_url = store(&services, &tenant, UploadKind::PaymentReceipt, receipt_file)?;
    services
        .payments
        .submit_receipt(&tenant, &payment.id, &receipt_url, now)?;
    println!("Tenant submitted receipt {receipt_url}");

    let payment = services.payments.approve_receipt(&landlord, &payment.id, now)?;
    println!("Landlord approved receipt; payment is {:?}", payment.status);

    let view = services.payments.accounting(
        &landlord,
        PaymentFilters::default(),
        1,
        DEFAULT_PER_PAGE,
        today,
    )?;
    println!("\n-- Accounting as of {today} --");
    for card in [&view.summary.collected, &view.summary.pending, &view.summary.overdue] {
        println!("{:<10} {:>12} ({} payments)", card.label, card.display, card.count);
    }
    for category in &view.summary.breakdown {
        println!("  {:<12} {:>12}", category.label, category.display);
    }
    if let Some(message) = view.empty_state {
        println!("{message}");
    }

    println!("\n{} notifications published", notifications.events().len());
    if args.show_notifications {
        for (who, session) in [("Landlord", &landlord), ("Tenant", &tenant)] {
            println!("\n-- {who} notifications --");
            for notification in services.notifications.inbox(session)? {
                println!("- {}", notification.message);
            }
        }
    }

    Ok(())
}

fn account(services: &Services, role: Role, name: &str, email: &str) -> Result<Session, ServiceError> {
    let now = Utc::now();
    services.users.register(
        NewUser {
            role,
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
        },
        now,
    )?;
    services.users.login(email, now)
}

/// Runs the same checks and transfer a browser upload by `uploader` would,
/// returning the stored file's URL.
fn store(
    services: &Services,
    uploader: &Session,
    kind: UploadKind,
    file: LocalFile,
) -> Result<String, ServiceError> {
    kind.preflight(&file)
        .map_err(|err| ServiceError::Invalid(err.to_string()))?;
    let now = Utc::now();
    let grant = services
        .uploads
        .presign_upload(kind, Some(uploader.user_id), &file.name, &file.content_type, now)?;
    let token = grant
        .upload_url
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let reference = services
        .uploads
        .complete_upload(&token, &file.content_type, file.bytes, now)?;
    Ok(reference.url)
}

fn first_of_next_month(today: NaiveDate) -> NaiveDate {
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today)
}
