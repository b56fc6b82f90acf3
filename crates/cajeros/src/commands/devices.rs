//! Device command handlers.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;
use tracing::info;

use cajeros_core::{
    Device, DeviceFilter, DevicePatch, DeviceScope, DeviceView, LiveMode, NewDevice, NoticeBoard,
    StatusFilter, SubscriptionState,
};

use crate::cli::{
    DeviceFieldArgs, DeviceFilterArgs, DeviceListArgs, DevicesArgs, DevicesCommand, LineStatusArg,
    StatusArg,
};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Count")]
    count: String,
    #[tabled(rename = "Daily")]
    daily: i64,
}

fn to_row(d: &Arc<Device>, color: bool) -> DeviceRow {
    DeviceRow {
        id: d.id.to_string(),
        name: d.name.clone(),
        status: output::paint_status(d.online, color),
        phone: d.phone_number.clone().unwrap_or_default(),
        group: d.group_id.clone().unwrap_or_default(),
        count: format!("{}/{}", d.count, d.max_count),
        daily: d.daily_count,
    }
}

/// A device listed against an investment amount.
#[derive(Serialize)]
struct CostedDevice {
    #[serde(flatten)]
    device: Arc<Device>,
    cost_per_daily_count: f64,
}

impl CostedDevice {
    fn new(device: &Arc<Device>, investment: f64) -> Self {
        Self {
            device: Arc::clone(device),
            cost_per_daily_count: device.cost_per_daily_count(investment).unwrap_or(0.0),
        }
    }
}

#[derive(Tabled)]
struct CostedDeviceRow {
    #[tabled(inline)]
    device: DeviceRow,
    #[tabled(rename = "Cost")]
    cost: String,
}

fn to_costed_row(d: &CostedDevice, color: bool) -> CostedDeviceRow {
    CostedDeviceRow {
        device: to_row(&d.device, color),
        cost: format!("${:.2}", d.cost_per_daily_count),
    }
}

fn detail(d: &Arc<Device>) -> String {
    [
        format!("ID:        {}", d.id),
        format!("Name:      {}", d.name),
        format!("Status:    {}", d.status()),
        format!("Phone:     {}", d.phone_number.as_deref().unwrap_or("-")),
        format!("Group:     {}", d.group_id.as_deref().unwrap_or("-")),
        format!("Count:     {} of {}", d.count, d.max_count),
        format!("Daily:     {}", d.daily_count),
    ]
    .join("\n")
}

// ── Argument translation ────────────────────────────────────────────

fn filter_from(args: &DeviceFilterArgs) -> DeviceFilter {
    let status = match args.status {
        StatusArg::All => StatusFilter::All,
        StatusArg::Online => StatusFilter::Online,
        StatusArg::Offline => StatusFilter::Offline,
    };
    DeviceFilter::new(args.name.clone().unwrap_or_default(), status)
}

fn patch_from(fields: DeviceFieldArgs) -> DevicePatch {
    DevicePatch {
        name: fields.name,
        online: fields.status.map(|s| matches!(s, LineStatusArg::Open)),
        phone_number: clearable(fields.phone, fields.clear_phone),
        group_id: clearable(fields.group, fields.clear_group),
        count: fields.count,
        max_count: fields.max_count,
        daily_count: fields.daily_count,
    }
}

/// `--x value` sets, `--clear-x` sends `null`, neither leaves it alone.
fn clearable(value: Option<String>, clear: bool) -> Option<Option<String>> {
    if clear { Some(None) } else { value.map(Some) }
}

fn scope_for(ctx: &Context<'_>, all: bool) -> Result<DeviceScope, CliError> {
    if all {
        return Ok(DeviceScope::All);
    }
    let session = ctx.dashboard.session().ok_or_else(|| CliError::PermissionDenied {
        message: "Not logged in".into(),
    })?;
    Ok(DeviceScope::Admin(session.admin_id()))
}

async fn fetch(ctx: &Context<'_>, all: bool) -> Result<Vec<Arc<Device>>, CliError> {
    let devices = if all {
        ctx.dashboard.all_devices().await?
    } else {
        ctx.dashboard.my_devices().await?
    };
    Ok(devices.into_iter().map(Arc::new).collect())
}

fn render_costed(ctx: &Context<'_>, devices: &[Arc<Device>], investment: f64) -> String {
    let color = output::should_color(&ctx.global.color);
    let costed: Vec<CostedDevice> = devices
        .iter()
        .map(|d| CostedDevice::new(d, investment))
        .collect();
    output::render_list(
        &ctx.global.output,
        &costed,
        |d| to_costed_row(d, color),
        |d| d.device.id.to_string(),
    )
}

fn render(ctx: &Context<'_>, devices: &[Arc<Device>]) -> String {
    let color = output::should_color(&ctx.global.color);
    output::render_list(
        &ctx.global.output,
        devices,
        |d| to_row(d, color),
        |d| d.id.to_string(),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context<'_>, args: DevicesArgs) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List(DeviceListArgs { filter, investment }) => {
            let devices = fetch(ctx, filter.all).await?;
            let shown = filter_from(&filter).apply(&devices);
            let out = match investment {
                Some(amount) => render_costed(ctx, &shown, amount),
                None => render(ctx, &shown),
            };
            output::print_output(&out, ctx.global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let id = util::resolve_device_id(ctx.dashboard, &device).await?;
            let devices = fetch(ctx, false).await?;
            let found = devices
                .iter()
                .find(|d| d.id == id)
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "device".into(),
                    identifier: device.clone(),
                    list_command: "devices list".into(),
                })?;
            let out = output::render_single(&ctx.global.output, found, detail, |d| {
                d.id.to_string()
            });
            output::print_output(&out, ctx.global.quiet);
            Ok(())
        }

        DevicesCommand::Watch(filter_args) => {
            let scope = scope_for(ctx, filter_args.all)?;
            let view = ctx.dashboard.watch_devices(scope).await?;
            watch(ctx, &view, &filter_from(&filter_args)).await;
            view.close().await;
            Ok(())
        }

        DevicesCommand::Update { device, fields } => {
            let patch = patch_from(fields);
            if patch.is_empty() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "pass at least one field to change".into(),
                });
            }
            let id = util::resolve_device_id(ctx.dashboard, &device).await?;
            ctx.dashboard.update_device(id, &patch).await?;
            output::print_notice(&format!("✓ Device {id} updated"), ctx.global.quiet);
            Ok(())
        }

        DevicesCommand::Create {
            name,
            phone,
            group,
            max_count,
        } => {
            let created = ctx
                .dashboard
                .create_device(&NewDevice {
                    name,
                    phone_number: phone,
                    group_id: group,
                    max_count,
                })
                .await?;
            let created = Arc::new(created);
            let out = output::render_single(&ctx.global.output, &created, detail, |d| {
                d.id.to_string()
            });
            output::print_output(&out, ctx.global.quiet);
            Ok(())
        }
    }
}

/// Print the filtered view on every mirror change until Ctrl-C or until the
/// view's source goes away. Realtime state changes are raised as notices and
/// shown under the table until they expire.
async fn watch(ctx: &Context<'_>, view: &DeviceView, filter: &DeviceFilter) {
    let mode = match view.mode() {
        LiveMode::Realtime => "realtime",
        LiveMode::Polling => "polling",
    };
    output::print_notice(
        &format!("Watching devices ({mode}); press Ctrl-C to stop"),
        ctx.global.quiet,
    );

    let mut notices = NoticeBoard::new();
    let mut stream = view.subscribe();
    redraw(ctx, filter, stream.current(), &mut notices);

    let mut state = view.realtime_state();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            snapshot = stream.changed() => {
                let Some(snapshot) = snapshot else { break };
                redraw(ctx, filter, &snapshot, &mut notices);
            }
            changed = async {
                match state.as_mut() {
                    Some(rx) => rx.changed().await.is_ok(),
                    None => std::future::pending().await,
                }
            } => {
                if changed {
                    if let Some(rx) = state.as_ref() {
                        let current = *rx.borrow();
                        info!(state = ?current, "realtime subscription");
                        notices.info(state_notice(current));
                        redraw(ctx, filter, stream.current(), &mut notices);
                    }
                } else {
                    state = None;
                }
            }
        }
    }
}

fn redraw(
    ctx: &Context<'_>,
    filter: &DeviceFilter,
    devices: &[Arc<Device>],
    notices: &mut NoticeBoard,
) {
    output::print_output(&render(ctx, &filter.apply(devices)), ctx.global.quiet);
    for notice in notices.active() {
        output::print_notice(&format!("[{}] {}", notice.kind, notice.message), ctx.global.quiet);
    }
}

fn state_notice(state: SubscriptionState) -> &'static str {
    match state {
        SubscriptionState::Active => "Realtime feed active",
        SubscriptionState::Subscribing => "Realtime feed connecting",
        SubscriptionState::Unsubscribed => "Realtime feed lost, reconnecting",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cajeros_core::DeviceId;

    fn device(id: i64, name: &str, online: bool) -> Arc<Device> {
        let mut d = Device::new(DeviceId::new(id));
        d.name = name.into();
        d.online = online;
        d.max_count = 10;
        Arc::new(d)
    }

    #[test]
    fn status_flag_maps_to_online() {
        let patch = patch_from(DeviceFieldArgs {
            name: None,
            status: Some(LineStatusArg::Close),
            phone: None,
            clear_phone: false,
            group: None,
            clear_group: false,
            count: None,
            max_count: None,
            daily_count: Some(0),
        });
        assert_eq!(patch.online, Some(false));
        assert_eq!(patch.daily_count, Some(0));
        assert!(patch.name.is_none());
    }

    #[test]
    fn clear_flags_send_null() {
        let patch = patch_from(DeviceFieldArgs {
            name: None,
            status: None,
            phone: None,
            clear_phone: true,
            group: Some("g2".into()),
            clear_group: false,
            count: None,
            max_count: None,
            daily_count: None,
        });
        assert_eq!(patch.phone_number, Some(None));
        assert_eq!(patch.group_id, Some(Some("g2".into())));
        assert!(!patch.is_empty());
    }

    #[test]
    fn filter_args_translate() {
        let filter = filter_from(&DeviceFilterArgs {
            all: false,
            name: Some("caj".into()),
            status: StatusArg::Online,
        });
        let devices = vec![device(1, "Cajero Norte", true), device(2, "Cajero Sur", false)];
        let shown = filter.apply(&devices);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, DeviceId::new(1));
    }

    #[test]
    fn cost_column_is_zero_without_daily_count() {
        let mut busy = Device::clone(&device(1, "A", true));
        busy.daily_count = 8;
        let idle = device(2, "B", true);

        let row = to_costed_row(&CostedDevice::new(&Arc::new(busy), 100.0), false);
        assert_eq!(row.cost, "$12.50");
        let row = to_costed_row(&CostedDevice::new(&idle, 100.0), false);
        assert_eq!(row.cost, "$0.00");
    }

    #[test]
    fn costed_json_flattens_device_fields() {
        let mut d = Device::clone(&device(3, "C", false));
        d.daily_count = 2;
        let value = serde_json::to_value(CostedDevice::new(&Arc::new(d), 5.0)).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["cost_per_daily_count"], 2.5);
    }

    #[tokio::test(start_paused = true)]
    async fn state_changes_become_expiring_notices() {
        let mut board = NoticeBoard::new();
        board.info(state_notice(SubscriptionState::Active));
        assert_eq!(board.active()[0].message, "Realtime feed active");
        assert_eq!(board.active()[0].kind.to_string(), "info");

        tokio::time::advance(std::time::Duration::from_secs(5)).await;
        assert!(board.active().is_empty());
    }

    #[test]
    fn row_formats_counts() {
        let row = to_row(&device(3, "C", false), false);
        assert_eq!(row.status, "close");
        assert_eq!(row.count, "0/10");
    }
}
