/*
Copyright (c) 2021 VMware, Inc.
SPDX-License-Identifier: MIT
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/


//! gRPC front end: serves the P4Runtime service for a [`Device`].

use anyhow::{Context, Result};

use futures_util::{FutureExt, SinkExt, TryFutureExt, TryStreamExt};

use grpcio::{
    DuplexSink, Environment, RequestStream, RpcContext, RpcStatus, RpcStatusCode, Server, ServerBuilder,
    ServerStreamingSink, UnarySink, WriteFlags,
};

use proto::p4runtime::{
    CapabilitiesRequest, CapabilitiesResponse, GetForwardingPipelineConfigRequest,
    GetForwardingPipelineConfigResponse, ReadRequest, ReadResponse, SetForwardingPipelineConfigRequest,
    SetForwardingPipelineConfigResponse, StreamMessageRequest, StreamMessageResponse, WriteRequest, WriteResponse,
};
use proto::p4runtime_grpc::{create_p4_runtime, P4Runtime};

use std::sync::Arc;

use tracing::{debug, error};

use crate::service::{Device, ServiceError};

pub fn status_code(e: &ServiceError) -> RpcStatusCode {
    match e {
        ServiceError::InvalidArgument(_) => RpcStatusCode::INVALID_ARGUMENT,
        ServiceError::NotFound(_) => RpcStatusCode::NOT_FOUND,
        ServiceError::AlreadyExists(_) => RpcStatusCode::ALREADY_EXISTS,
        ServiceError::FailedPrecondition(_) => RpcStatusCode::FAILED_PRECONDITION,
        ServiceError::ResourceExhausted(_) => RpcStatusCode::RESOURCE_EXHAUSTED,
    }
}

fn rpc_status(e: &ServiceError) -> RpcStatus {
    RpcStatus::with_message(status_code(e), e.message().to_string())
}

#[derive(Clone)]
pub struct P4RuntimeService {
    device: Arc<Device>,
}

impl P4RuntimeService {
    pub fn new(device: Arc<Device>) -> P4RuntimeService {
        P4RuntimeService { device }
    }
}

fn unary_fail<T>(ctx: &RpcContext, sink: UnarySink<T>, status: RpcStatus) {
    let f = sink
        .fail(status)
        .map_err(|e| error!("failed to send error: {:?}", e))
        .map(|_| ());
    ctx.spawn(f);
}

fn unary_success<T>(ctx: &RpcContext, sink: UnarySink<T>, reply: T) {
    let f = sink
        .success(reply)
        .map_err(|e: grpcio::Error| error!("failed to send reply: {:?}", e))
        .map(|_| ());
    ctx.spawn(f);
}

fn unary_reply<T>(ctx: &RpcContext, sink: UnarySink<T>, result: Result<T, ServiceError>) {
    match result {
        Ok(reply) => unary_success(ctx, sink, reply),
        Err(e) => unary_fail(ctx, sink, rpc_status(&e)),
    }
}

fn server_streaming_fail<T>(ctx: &RpcContext, sink: ServerStreamingSink<T>, status: RpcStatus) {
    let f = sink
        .fail(status)
        .map_err(|e| error!("failed to send error: {:?}", e))
        .map(|_| ());
    ctx.spawn(f);
}

fn server_streaming_success<T: Send + 'static>(ctx: &RpcContext, mut sink: ServerStreamingSink<T>, reply: Vec<T>) {
    let f = async move {
        for msg in reply {
            sink.send((msg, WriteFlags::default())).await?;
        }
        sink.close().await?;
        Ok(())
    }
    .map_err(|e: grpcio::Error| error!("failed to stream response: {:?}", e))
    .map(|_| ());
    ctx.spawn(f);
}

impl P4Runtime for P4RuntimeService {
    fn write(&mut self, ctx: RpcContext, req: WriteRequest, sink: UnarySink<WriteResponse>) {
        debug!("write {} updates", req.get_updates().len());
        let result = self.device.write(&req).map(|()| WriteResponse::new());
        unary_reply(&ctx, sink, result);
    }

    fn read(&mut self, ctx: RpcContext, req: ReadRequest, sink: ServerStreamingSink<ReadResponse>) {
        debug!("read {} entities", req.get_entities().len());
        match self.device.read(&req) {
            Ok(responses) => server_streaming_success(&ctx, sink, responses),
            Err(e) => server_streaming_fail(&ctx, sink, rpc_status(&e)),
        }
    }

    fn set_forwarding_pipeline_config(
        &mut self,
        ctx: RpcContext,
        req: SetForwardingPipelineConfigRequest,
        sink: UnarySink<SetForwardingPipelineConfigResponse>,
    ) {
        debug!("set_forwarding_pipeline_config");
        let result = self
            .device
            .set_pipeline_config(&req)
            .map(|()| SetForwardingPipelineConfigResponse::new());
        unary_reply(&ctx, sink, result);
    }

    fn get_forwarding_pipeline_config(
        &mut self,
        ctx: RpcContext,
        _req: GetForwardingPipelineConfigRequest,
        sink: UnarySink<GetForwardingPipelineConfigResponse>,
    ) {
        debug!("get_forwarding_pipeline_config");
        let result = self.device.get_pipeline_config().map(|config| {
            let mut reply = GetForwardingPipelineConfigResponse::new();
            reply.set_config(config);
            reply
        });
        unary_reply(&ctx, sink, result);
    }

    fn stream_channel(
        &mut self,
        ctx: RpcContext,
        mut stream: RequestStream<StreamMessageRequest>,
        mut sink: DuplexSink<StreamMessageResponse>,
    ) {
        let device = self.device.clone();
        let f = async move {
            while let Some(msg) = stream.try_next().await? {
                if let Some(reply) = device.stream_message(&msg) {
                    sink.send((reply, WriteFlags::default())).await?;
                }
            }
            sink.close().await?;
            Ok(())
        }
        .map_err(|e: grpcio::Error| debug!("stream_channel ended: {:?}", e))
        .map(|_| ());
        ctx.spawn(f)
    }

    fn capabilities(&mut self, ctx: RpcContext, _req: CapabilitiesRequest, sink: UnarySink<CapabilitiesResponse>) {
        let mut reply = CapabilitiesResponse::new();
        reply.set_p4runtime_api_version(self.device.capabilities().into());
        unary_success(&ctx, sink, reply);
    }
}

/// Starts serving `device` on `addr`:`port` with `workers` completion queues.  Port 0 picks an
/// ephemeral port; [`Server::bind_addrs`] reports the one chosen.
pub fn start(device: Arc<Device>, addr: &str, port: u16, workers: usize) -> Result<Server> {
    let env = Arc::new(Environment::new(workers.max(1)));
    let service = create_p4_runtime(P4RuntimeService::new(device));
    let mut server = ServerBuilder::new(env)
        .register_service(service)
        .bind(addr, port)
        .build()
        .with_context(|| format!("failed to bind P4Runtime server to {}:{}", addr, port))?;
    server.start();
    Ok(server)
}
