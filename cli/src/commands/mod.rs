mod helpers;
mod progress;
mod session;
mod settings;
mod workout;

pub(crate) use progress::{cmd_achievements, cmd_day, cmd_stats, cmd_timeline};
pub(crate) use session::{cmd_login, cmd_logout, cmd_whoami};
pub(crate) use settings::{
    SettingsArgs, cmd_profile_avatar, cmd_profile_set, cmd_profile_show, cmd_settings_set,
    cmd_settings_show,
};
pub(crate) use workout::{
    cmd_done, cmd_workout_add, cmd_workout_delete, cmd_workout_edit, cmd_workout_list,
    cmd_workout_photo, cmd_workout_show, cmd_workout_video,
};
