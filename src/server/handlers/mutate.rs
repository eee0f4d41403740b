// 删除与重命名处理器
//
// 两者都接收表单字段中的相对路径，操作成功后 303 跳转回父目录列表

use axum::{
    extract::{Form, State},
    response::Redirect,
};
use serde::Deserialize;

use crate::filesystem::FsError;
use crate::server::state::AppState;

use super::href_for;

/// 删除表单
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    /// 待删除条目的相对路径
    pub path: String,
}

/// POST /delete
pub async fn delete_entry(
    State(state): State<AppState>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect, FsError> {
    let vp = state.drive.resolver().resolve(Some(&form.path))?;
    state.drive.delete_entry(&vp)?;
    Ok(Redirect::to(&href_for(vp.parent_rel())))
}

/// 重命名表单
#[derive(Debug, Deserialize)]
pub struct RenameForm {
    /// 原条目相对路径
    pub old_path: String,
    /// 新名称（单段，不含路径分隔符）
    pub new_name: String,
}

/// POST /rename
pub async fn rename_entry(
    State(state): State<AppState>,
    Form(form): Form<RenameForm>,
) -> Result<Redirect, FsError> {
    let vp = state.drive.resolver().resolve(Some(&form.old_path))?;
    state.drive.rename_entry(&vp, &form.new_name)?;
    Ok(Redirect::to(&href_for(vp.parent_rel())))
}
