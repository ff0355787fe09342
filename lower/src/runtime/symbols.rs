//! CUDA runtime symbol tables carried from the upstream runtime headers.
//!
//! `CUDART_SYMBOLS` is the allow-list of runtime entry points the vendor
//! rename policy recognizes; lookups go through a lazily sorted copy.
//! `INEQUIVALENT_SYMBOLS` names the recognized calls with no usable HIP
//! counterpart.

use once_cell::sync::Lazy;

pub(crate) static SORTED_CUDART_SYMBOLS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut names = CUDART_SYMBOLS.to_vec();
    names.sort_unstable();
    names
});

/// Recognized but lacking a semantically equivalent HIP entry point.
pub(crate) const INEQUIVALENT_SYMBOLS: &[&str] = &["cudaGetDeviceProperties"];

pub(crate) const CUDART_SYMBOLS: &[&str] = &[
    "cudaGetDevice", "cudaWaitExternalSemaphoresAsync_ptsz", "cudaStreamAddCallback",
    "cudaMemcpyArrayToArray", "cudaDeviceReset", "cudaGraphAddEventRecordNode",
    "cudaGetSurfaceObjectResourceDesc", "cudaGraphicsSubResourceGetMappedArray", "cudaMemRangeGetAttributes",
    "cudaGraphAddKernelNode", "cudaGraphDestroy", "cudaGraphAddExternalSemaphoresSignalNode",
    "cudaGraphExecChildGraphNodeSetParams", "cudaEGLStreamConsumerReleaseFrame", "__cudaRegisterManagedVar",
    "cudaMemcpy2DFromArray", "cudaEventRecord_ptsz", "cudaSetDoubleForHost",
    "cudaGraphExternalSemaphoresWaitNodeSetParams", "cudaMemPoolSetAttribute", "cudaDeviceFlushGPUDirectRDMAWrites",
    "cudaDestroyExternalMemory", "cudaDeviceGetGraphMemAttribute", "cudaEGLStreamConsumerConnect",
    "cudaGraphUpload", "cudaDestroyTextureObject", "cudaHostGetFlags",
    "cudaStreamQuery_ptsz", "cudaHostGetDevicePointer", "cudaPointerGetAttributes",
    "cudaWaitExternalSemaphoresAsync_v2", "cudaFuncSetAttribute", "cudaDeviceGetSharedMemConfig",
    "cudaGetDeviceFlags", "cudaGraphGetNodes", "cudaGraphMemAllocNodeGetParams",
    "cudaMemcpy3D", "cudaMemcpy2DArrayToArray", "cudaBindTextureToArray",
    "cudaDeviceDisablePeerAccess", "cudaGraphMemsetNodeGetParams", "cudaGraphExecExternalSemaphoresWaitNodeSetParams",
    "cudaGraphNodeGetDependentNodes", "cudaEventDestroy", "cudaDeviceCanAccessPeer",
    "cudaArrayGetInfo", "cudaMemcpyAsync", "cudaStreamEndCapture_ptsz",
    "cudaGraphMemFreeNodeGetParams", "cudaGraphExecMemcpyNodeSetParams1D", "cudaOccupancyMaxActiveBlocksPerMultiprocessor",
    "cudaGraphAddChildGraphNode", "cudaGraphicsGLRegisterImage", "cudaGraphExecMemcpyNodeSetParamsToSymbol",
    "cudaProfilerInitialize", "cudaWaitExternalSemaphoresAsync", "cudaMalloc3DArray",
    "cudaGraphKernelNodeSetParams", "cudaProfilerStart", "cudaGraphChildGraphNodeGetGraph",
    "cudaGetErrorString", "cudaMemset", "cudaGraphMemcpyNodeSetParamsFromSymbol",
    "cudaMemset3D", "cudaGraphExecMemcpyNodeSetParamsFromSymbol", "cudaMemcpyArrayToArray_ptds",
    "cudaMemcpy2D", "cudaGraphDestroyNode", "cudaStreamWaitEvent",
    "cudaMemcpy2DToArrayAsync_ptsz", "cudaGraphEventRecordNodeGetEvent", "cudaSetDoubleForDevice",
    "cudaLaunchCooperativeKernel_ptsz", "cudaLaunchKernel", "cudaFuncSetSharedMemConfig",
    "cudaPeekAtLastError", "cudaMemcpy3DAsync_ptsz", "cudaEventCreate",
    "cudaMemPrefetchAsync_ptsz", "cudaMalloc", "cudaMemPoolSetAccess",
    "cudaBindTexture2D", "cudaMemPoolTrimTo", "cudaThreadGetLimit",
    "cudaGraphMemsetNodeSetParams", "cudaGLRegisterBufferObject", "cudaGraphicsVDPAURegisterOutputSurface",
    "cudaOccupancyMaxActiveBlocksPerMultiprocessorWithFlags", "cudaEventCreateFromEGLSync", "cudaGraphExternalSemaphoresSignalNodeGetParams",
    "cudaMemPoolExportPointer", "cudaGraphNodeFindInClone", "cudaGetTextureAlignmentOffset",
    "cudaSignalExternalSemaphoresAsync_v2_ptsz", "cudaGraphKernelNodeGetAttribute", "cudaHostUnregister",
    "cudaStreamSetAttribute", "cudaLaunchHostFunc", "__cudaRegisterFatBinaryEnd",
    "cudaGetTextureObjectResourceDesc", "cudaGraphExternalSemaphoresSignalNodeSetParams", "cudaMemPoolImportFromShareableHandle",
    "cudaStreamDestroy", "cudaMalloc3D", "cudaGLSetGLDevice",
    "cudaGraphRetainUserObject", "cudaGraphExecExternalSemaphoresSignalNodeSetParams", "cudaMemAdvise",
    "cudaEventRecordWithFlags", "cudaMemcpy3DPeerAsync_ptsz", "cudaGraphExecMemcpyNodeSetParams",
    "cudaProfilerStop", "cudaFreeMipmappedArray", "cudaStreamCopyAttributes_ptsz",
    "cudaMemcpyFromArray", "cudaMemcpy3DPeer", "cudaMemPoolImportPointer",
    "cudaMemPoolCreate", "cudaCreateTextureObject", "cudaGraphExecDestroy",
    "cudaMemGetInfo", "cudaStreamGetFlags", "cudaGetMipmappedArrayLevel",
    "cudaMemset2DAsync_ptsz", "cudaMemcpyAsync_ptsz", "cudaCreateSurfaceObject",
    "cudaMemRangeGetAttribute", "cudaStreamCopyAttributes", "cudaMemcpyToSymbol",
    "cudaMemcpy3D_ptds", "cudaGLUnregisterBufferObject", "cudaGraphInstantiate",
    "cudaStreamBeginCapture", "cudaDestroySurfaceObject", "cudaMemcpy3DAsync",
    "cudaFuncGetAttributes", "cudaStreamIsCapturing_ptsz", "cudaChooseDevice",
    "cudaGraphExecMemsetNodeSetParams", "cudaArrayGetPlane", "__cudaPopCallConfiguration",
    "cudaThreadSetCacheConfig", "cudaStreamAttachMemAsync_ptsz", "cudaGLMapBufferObjectAsync",
    "cudaMemcpyFromArrayAsync_ptsz", "cudaMemcpy2DFromArrayAsync_ptsz", "cudaMemcpyToArrayAsync_ptsz",
    "cudaArrayGetSparseProperties", "cudaExternalMemoryGetMappedMipmappedArray", "cudaGraphClone",
    "cudaStreamGetPriority_ptsz", "cudaRuntimeGetVersion", "cudaMemPoolDestroy",
    "cudaGraphMemcpyNodeSetParamsToSymbol", "cudaGraphExecUpdate", "cudaEGLStreamConsumerDisconnect",
    "cudaGetSymbolAddress", "__cudaRegisterVar", "cudaStreamGetCaptureInfo",
    "cudaMemcpy3DPeerAsync", "cudaMemcpyPeer", "cudaDeviceGetByPCIBusId",
    "cudaEGLStreamProducerDisconnect", "cudaEGLStreamConsumerAcquireFrame", "__cudaRegisterTexture",
    "cudaGraphicsVDPAURegisterVideoSurface", "cudaDeviceSetCacheConfig", "cudaMemcpyFromArrayAsync",
    "cudaGraphEventRecordNodeSetEvent", "cudaGraphAddMemcpyNode", "cudaDeviceGetDefaultMemPool",
    "cudaStreamSynchronize_ptsz", "cudaBindSurfaceToArray", "cudaMallocAsync",
    "cudaGraphGetEdges", "cudaGetDriverEntryPoint_ptsz", "cudaGraphMemcpyNodeSetParams1D",
    "cudaGraphKernelNodeCopyAttributes", "cudaVDPAUSetVDPAUDevice", "cudaDeviceGraphMemTrim",
    "cudaGraphicsResourceGetMappedMipmappedArray", "cudaThreadSynchronize", "cudaDeviceGetTexture1DLinearMaxWidth",
    "cudaDeviceSynchronize", "cudaMemcpyFromSymbolAsync", "cudaSetValidDevices",
    "cudaOccupancyAvailableDynamicSMemPerBlock", "cudaStreamSetAttribute_ptsz", "cudaMemcpyFromSymbol",
    "cudaStreamEndCapture", "cudaImportExternalMemory", "__cudaRegisterSurface",
    "cudaThreadSetLimit", "cudaGLMapBufferObject", "cudaBindTextureToMipmappedArray",
    "cudaGraphUpload_ptsz", "cudaGLGetDevices", "cudaGraphAddMemAllocNode",
    "cudaMemsetAsync", "cudaGLUnmapBufferObjectAsync", "cudaUserObjectRetain",
    "cudaGraphNodeGetDependencies", "cudaStreamCreateWithPriority", "cudaStreamGetCaptureInfo_ptsz",
    "cudaStreamGetAttribute", "cudaStreamAttachMemAsync", "cudaGetDeviceCount",
    "cudaMemset3D_ptds", "cudaFreeAsync", "cudaUserObjectRelease",
    "cudaCreateChannelDesc", "cudaGetSurfaceReference", "cudaGetChannelDesc",
    "cudaGraphDebugDotPrint", "cudaEGLStreamProducerPresentFrame", "cudaEventQuery",
    "cudaStreamBeginCapture_ptsz", "cudaMallocMipmappedArray", "cudaThreadExchangeStreamCaptureMode",
    "cudaStreamGetFlags_ptsz", "cudaStreamUpdateCaptureDependencies_ptsz", "cudaGraphicsGLRegisterBuffer",
    "cudaDeviceGetNvSciSyncAttributes", "cudaEGLStreamProducerReturnFrame", "cudaIpcOpenEventHandle",
    "cudaMemPoolGetAccess", "cudaGraphicsResourceGetMappedPointer", "cudaMallocFromPoolAsync",
    "cudaCtxResetPersistingL2Cache", "cudaMemcpyFromSymbol_ptds", "cudaDeviceEnablePeerAccess",
    "cudaEGLStreamConsumerConnectWithFlags", "cudaGraphInstantiateWithFlags", "__cudaRegisterHostVar",
    "cudaGetLastError", "cudaMemcpy3DPeer_ptds", "cudaGraphAddMemsetNode",
    "cudaEGLStreamProducerConnect", "cudaExternalMemoryGetMappedBuffer", "cudaGetExportTable",
    "cudaMallocManaged", "cudaThreadExit", "cudaDeviceGetMemPool",
    "cudaGraphicsMapResources", "cudaGraphEventWaitNodeGetEvent", "cudaDeviceGetCacheConfig",
    "cudaStreamQuery", "cudaGraphGetRootNodes", "cudaGraphMemcpyNodeSetParams",
    "cudaDeviceSetGraphMemAttribute", "cudaHostAlloc", "cudaMemcpy2DAsync",
    "cudaFreeHost", "cudaGLUnmapBufferObject", "cudaGraphAddEmptyNode",
    "cudaMemcpyToArray", "cudaMemcpy2DFromArrayAsync", "cudaMemset_ptds",
    "cudaDeviceSetSharedMemConfig", "cudaGraphicsResourceSetMapFlags", "cudaIpcGetEventHandle",
    "cudaGraphAddEventWaitNode", "cudaGraphKernelNodeSetAttribute", "cudaEventRecordWithFlags_ptsz",
    "cudaGraphicsUnregisterResource", "cudaGraphHostNodeSetParams", "cudaGetSymbolSize",
    "cudaMemcpyToArray_ptds", "cudaMemcpyToArrayAsync", "cudaGraphicsUnmapResources",
    "cudaSetDevice", "cudaMemcpyFromSymbolAsync_ptsz", "cudaMemcpyToSymbol_ptds",
    "cudaGraphKernelNodeGetParams", "cudaIpcGetMemHandle", "cudaMipmappedArrayGetSparseProperties",
    "cudaMemcpy", "cudaFreeArray", "cudaLaunchKernel_ptsz",
    "cudaStreamWaitEvent_ptsz", "cudaGraphCreate", "cudaDeviceGetStreamPriorityRange",
    "__cudaUnregisterFatBinary", "cudaGraphEventWaitNodeSetEvent", "cudaDeviceGetPCIBusId",
    "cudaMemPoolExportToShareableHandle", "cudaDeviceGetAttribute", "cudaStreamAddCallback_ptsz",
    "cudaGraphicsEGLRegisterImage", "cudaMemset3DAsync_ptsz", "cudaMemsetAsync_ptsz",
    "cudaGLSetBufferObjectMapFlags", "cudaMemcpy2DToArrayAsync", "cudaMemcpy2DToArray",
    "cudaVDPAUGetDevice", "cudaUnbindTexture", "cudaGetFuncBySymbol",
    "cudaGraphAddHostNode", "cudaSignalExternalSemaphoresAsync_ptsz", "cudaStreamCreateWithFlags",
    "__cudaInitModule", "cudaGraphExecEventRecordNodeSetEvent", "cudaMemPrefetchAsync",
    "cudaFuncSetCacheConfig", "cudaStreamGetAttribute_ptsz", "cudaDeviceSetLimit",
    "cudaDriverGetVersion", "cudaGraphExternalSemaphoresWaitNodeGetParams", "cudaGraphMemcpyNodeGetParams",
    "cudaGetTextureReference", "cudaDeviceSetMemPool", "cudaSignalExternalSemaphoresAsync",
    "cudaSetDeviceFlags", "cudaMemcpy2D_ptds", "cudaGraphLaunch_ptsz",
    "cudaMemset3DAsync", "cudaEventCreateWithFlags", "cudaStreamCreate",
    "cudaMallocAsync_ptsz", "cudaEventElapsedTime", "cudaGraphLaunch",
    "cudaGetTextureObjectTextureDesc", "cudaStreamGetCaptureInfo_v2", "__cudaRegisterFunction",
    "cudaGraphAddDependencies", "cudaMemset2D", "cudaGraphExecKernelNodeSetParams",
    "cudaDeviceGetP2PAttribute", "cudaDestroyExternalSemaphore", "cudaFreeAsync_ptsz",
    "__cudaRegisterFatBinary", "cudaGraphAddMemcpyNodeToSymbol", "cudaStreamUpdateCaptureDependencies",
    "cudaGraphAddMemFreeNode", "cudaDeviceGetLimit", "cudaStreamGetCaptureInfo_v2_ptsz",
    "__cudaPushCallConfiguration", "cudaMemcpy2DFromArray_ptds", "cudaGetTextureObjectResourceViewDesc",
    "cudaGraphNodeGetType", "cudaMemcpyToSymbolAsync", "cudaSignalExternalSemaphoresAsync_v2",
    "cudaMallocFromPoolAsync_ptsz", "cudaLaunchCooperativeKernel", "cudaStreamIsCapturing",
    "cudaHostRegister", "cudaGraphAddExternalSemaphoresWaitNode", "cudaGraphExecEventWaitNodeSetEvent",
    "cudaIpcOpenMemHandle", "cudaLaunchCooperativeKernelMultiDevice", "cudaMemcpy_ptds",
    "cudaMemcpy2DAsync_ptsz", "cudaGetDeviceProperties", "cudaImportExternalSemaphore",
    "cudaMemcpyToSymbolAsync_ptsz", "cudaBindTexture", "cudaGraphicsResourceGetMappedEglFrame",
    "cudaIpcCloseMemHandle", "cudaWaitExternalSemaphoresAsync_v2_ptsz", "cudaGraphHostNodeGetParams",
    "cudaStreamSynchronize", "cudaEventSynchronize", "cudaUserObjectCreate",
    "cudaGetErrorName", "cudaThreadGetCacheConfig", "cudaGraphRemoveDependencies",
    "cudaStreamGetPriority", "cudaMemset2DAsync", "cudaMemcpy2DArrayToArray_ptds",
    "cudaGraphReleaseUserObject", "cudaFree", "cudaGetDriverEntryPoint",
    "cudaMemcpy2DToArray_ptds", "cudaGraphAddMemcpyNodeFromSymbol", "cudaMemPoolGetAttribute",
    "cudaMemset2D_ptds", "cudaGraphAddMemcpyNode1D", "cudaMallocHost",
    "cudaGraphExecHostNodeSetParams", "cudaMallocArray", "cudaLaunchHostFunc_ptsz",
    "cudaMemcpyFromArray_ptds", "cudaEventRecord", "cudaMemcpyPeerAsync",
    "cudaMallocPitch",
];
