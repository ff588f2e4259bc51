use log::info;
use serde::Serialize;
use std::collections::HashSet;

use super::Gallery;
use crate::comments;
use crate::error::StoreError;
use crate::models::{
    AppRequest, Comment, CommentTarget, HelpRequest, NewAppRequest, NewHelpRequest, RequestStatus,
    Toggle,
};

#[derive(Debug, Clone, Serialize)]
pub struct HelpThread {
    pub request: HelpRequest,
    pub comments: Vec<Comment>,
}

impl Gallery {
    // Idea board, most wanted first
    pub async fn requests(&self) -> Result<Vec<AppRequest>, StoreError> {
        self.db.list_app_requests().await
    }

    pub async fn add_request(
        &self,
        new_request: NewAppRequest,
        user_session: Option<&str>,
    ) -> Result<AppRequest, StoreError> {
        let request = self.db.create_app_request(new_request, user_session).await?;
        info!("Added app request {} ({})", request.title, request.id);
        Ok(request)
    }

    pub async fn toggle_request_vote(
        &self,
        request_id: &str,
        user_session: &str,
    ) -> Result<Toggle, StoreError> {
        self.db.toggle_request_vote(request_id, user_session).await
    }

    pub async fn voted_requests(&self, user_session: &str) -> Result<HashSet<String>, StoreError> {
        self.db.fetch_user_request_votes(user_session).await
    }

    pub async fn set_request_status(
        &self,
        request_id: &str,
        status: RequestStatus,
    ) -> Result<(), StoreError> {
        self.db.set_request_status(request_id, status).await?;
        info!("App request {} is now {}", request_id, status);
        Ok(())
    }

    // Help board, newest first, each with its comment threads
    pub async fn help_requests(&self) -> Result<Vec<HelpThread>, StoreError> {
        let requests = self.db.list_help_requests().await?;
        let mut threads = Vec::with_capacity(requests.len());
        for request in requests {
            threads.push(self.help_thread(request).await?);
        }
        Ok(threads)
    }

    pub async fn help_detail(&self, request_id: &str) -> Result<HelpThread, StoreError> {
        let request = self.db.get_help_request(request_id).await?;
        self.help_thread(request).await
    }

    pub async fn add_help_request(
        &self,
        new_request: NewHelpRequest,
    ) -> Result<HelpRequest, StoreError> {
        let request = self.db.create_help_request(new_request).await?;
        info!("Added help request for {} ({})", request.app_name, request.id);
        Ok(request)
    }

    async fn help_thread(&self, request: HelpRequest) -> Result<HelpThread, StoreError> {
        let target = CommentTarget::Help(request.id.clone());
        let comments = comments::build_tree(self.db.fetch_comments(&target).await?);
        Ok(HelpThread { request, comments })
    }
}
