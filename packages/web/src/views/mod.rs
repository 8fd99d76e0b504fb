mod field;
pub use field::TextField;

mod guarded;
pub use guarded::Guarded;

mod shell;
pub use shell::Shell;

mod widgets;

mod mode_selection;
pub use mode_selection::ModeSelection;

mod login;
pub use login::Login;

mod register;
pub use register::Register;

mod dashboard;
pub use dashboard::Dashboard;

mod profile;
pub use profile::Profile;

mod member_detail;
pub use member_detail::MemberDetail;

mod add_member;
pub use add_member::AddMember;

mod not_found;
pub use not_found::NotFound;

pub const BASE_CSS: &str = r#"
body {
    margin: 0;
    background: #f7f5ff;
    color: #1f1a33;
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
}
h1, h2, h3 { margin: 0 0 0.5rem; }
.muted { color: #6b6580; }
.small { font-size: 0.8125rem; }
.error { color: #b42318; background: #fee4e2; padding: 0.5rem 0.75rem; border-radius: 6px; margin: 0.5rem 0; }
.notice { color: #05603a; background: #d1fadf; padding: 0.5rem 0.75rem; border-radius: 6px; margin: 0.5rem 0; }
.screen-center {
    display: flex; flex-direction: column; align-items: center; justify-content: center;
    min-height: 100vh; padding: 2rem; gap: 1rem; text-align: center;
}
.card { background: #ffffff; border: 1px solid #e4e0f5; border-radius: 12px; padding: 1.25rem; box-shadow: 0 1px 3px rgba(31, 26, 51, 0.08); }
.form-card { width: 100%; max-width: 420px; text-align: left; }
.form-card form { display: flex; flex-direction: column; gap: 0.5rem; margin-top: 1rem; }
.form-card input { padding: 0.5rem 0.625rem; border: 1px solid #d0cbe6; border-radius: 6px; font-size: 0.9375rem; }
fieldset { border: none; padding: 0; display: flex; gap: 1rem; }
.btn { display: inline-flex; align-items: center; justify-content: center; padding: 0.5rem 1rem; border-radius: 6px; border: none; font-size: 0.9375rem; cursor: pointer; text-decoration: none; }
.btn:disabled { opacity: 0.5; cursor: not-allowed; }
.btn-primary { background: #6d4aff; color: #ffffff; }
.btn-ghost { background: transparent; color: #6d4aff; }
.wide { width: 100%; }
.mode-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 1rem; width: 100%; max-width: 640px; }
.mode-card { cursor: pointer; text-align: center; font: inherit; }
.shell-header { display: flex; justify-content: space-between; align-items: center; padding: 0.75rem 1.5rem; background: #ffffff; border-bottom: 1px solid #e4e0f5; }
.shell-user { display: flex; align-items: center; gap: 0.75rem; }
.brand { font-weight: 700; color: #1f1a33; text-decoration: none; }
.mode-badge { font-size: 0.75rem; background: #ece7ff; color: #6d4aff; padding: 0.125rem 0.5rem; border-radius: 999px; }
.shell-main { max-width: 860px; margin: 0 auto; padding: 1.5rem; }
.stack { display: flex; flex-direction: column; gap: 1rem; }
.row { display: flex; gap: 0.75rem; align-items: center; }
.spread { justify-content: space-between; }
.meter { height: 10px; background: #ece7ff; border-radius: 999px; overflow: hidden; margin: 0.5rem 0; }
.meter-fill { height: 100%; }
.meter-fill.ok { background: #12b76a; }
.meter-fill.low { background: #f04438; }
.alerts { list-style: none; padding: 0; margin: 0; display: flex; flex-direction: column; gap: 0.5rem; }
.alerts li { display: flex; flex-direction: column; padding: 0.5rem; background: #fff4ed; border-radius: 6px; }
.alert-time { font-size: 0.75rem; color: #b93815; }
.stats { display: grid; grid-template-columns: repeat(3, 1fr); gap: 0.75rem; margin: 1rem 0; }
.stat { display: flex; flex-direction: column; align-items: center; }
.search { width: 100%; padding: 0.5rem 0.75rem; border: 1px solid #d0cbe6; border-radius: 6px; margin-bottom: 1rem; box-sizing: border-box; }
.members { list-style: none; padding: 0; display: flex; flex-direction: column; gap: 0.5rem; }
.member-row { display: flex; justify-content: space-between; align-items: center; color: inherit; text-decoration: none; }
.member-meta { display: flex; gap: 0.5rem; align-items: center; font-size: 0.8125rem; }
.status.online { color: #12b76a; }
.status.away { color: #f79009; }
.status.offline { color: #98a2b3; }
.battery.low { color: #f04438; }
.alert-count { color: #b42318; }
.document { display: flex; justify-content: space-between; align-items: flex-start; flex-wrap: wrap; gap: 0.5rem; padding: 0.5rem 0; border-bottom: 1px solid #f0edf9; }
.share-panel { width: 100%; display: flex; flex-direction: column; gap: 0.5rem; }
.share-panel form { display: flex; flex-direction: column; gap: 0.5rem; }
"#;
